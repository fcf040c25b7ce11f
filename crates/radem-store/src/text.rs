//! Delimited text table store.
//!
//! One flat CSV file per table: a header row of `time` plus the column
//! names, then one row per time index with RFC3339 timestamps. Unlike the
//! binary store, text reload is only guaranteed up to decimal serialization
//! precision; callers compare with [`ChannelTable::approx_eq`] rather than
//! exact equality.

use std::path::Path;

use radem_common::table::ChannelTable;
use radem_common::time::parse_datetime;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Write a table as a CSV file.
pub fn write_csv(table: &ChannelTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(table.n_cols() + 1);
    header.push("time".to_string());
    header.extend(table.column_names().iter().cloned());
    writer.write_record(&header)?;

    for i in 0..table.n_rows() {
        let mut record = Vec::with_capacity(table.n_cols() + 1);
        record.push(table.times()[i].to_rfc3339());
        for value in table.row(i) {
            record.push(value.to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush().map_err(StoreError::Io)?;

    debug!(path = %path.display(), rows = table.n_rows(), cols = table.n_cols(), "Wrote CSV table");
    Ok(())
}

/// Read a table back from a CSV file.
///
/// The label is not stored in the text form, so the caller supplies it;
/// the column schema is taken from the header row.
pub fn read_csv(path: &Path, label: &str) -> Result<ChannelTable> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = reader.headers()?;
    if headers.is_empty() || &headers[0] != "time" {
        return Err(StoreError::InvalidText(format!(
            "{}: first header column must be 'time'",
            path.display()
        )));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

    let mut table = ChannelTable::new(label, columns);
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let time = parse_datetime(&record[0]).map_err(|e| {
            StoreError::InvalidText(format!("{}: row {}: {}", path.display(), idx + 1, e))
        })?;
        let values = record
            .iter()
            .skip(1)
            .map(|field| {
                field.parse::<f64>().map_err(|_| {
                    StoreError::InvalidText(format!(
                        "{}: row {}: invalid number {:?}",
                        path.display(),
                        idx + 1,
                        field
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        table.push_row(time, values)?;
    }

    debug!(path = %path.display(), rows = table.n_rows(), "Read CSV table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, s).unwrap()
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let table = ChannelTable::from_rows(
            "test",
            vec!["a".to_string(), "b".to_string()],
            vec![
                (t(0), vec![1.0 / 3.0, -2.25]),
                (t(1), vec![6.02214076e23, 1e-300]),
            ],
        )
        .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("table.csv");
        write_csv(&table, &path).unwrap();
        let reloaded = read_csv(&path, "test").unwrap();

        assert!(table.approx_eq(&reloaded, 1e-12));
    }

    #[test]
    fn test_nan_survives_text_form() {
        let table = ChannelTable::from_rows(
            "test",
            vec!["a".to_string()],
            vec![(t(0), vec![f64::NAN])],
        )
        .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("table.csv");
        write_csv(&table, &path).unwrap();
        let reloaded = read_csv(&path, "test").unwrap();
        assert!(reloaded.column("a").unwrap()[0].is_nan());
    }

    #[test]
    fn test_header_must_start_with_time() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(
            read_csv(&path, "test"),
            Err(StoreError::InvalidText(_))
        ));
    }
}
