//! Integration tests for the decoded-record reader and the three ingest
//! call patterns.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use radem_common::time::DateRange;
use radem_ingest::{
    ingest, ChannelKind, DecodedFileSource, IngestPattern, ReadInput, RecordSource,
};

/// Write a decoded record file covering one day with `n_rows` rows spaced a
/// minute apart, every value set to `fill`.
fn write_decoded(dir: &Path, kind: ChannelKind, date: NaiveDate, n_rows: usize, fill: f64) {
    let cols = kind.columns();
    let mut out = String::from("time");
    for c in &cols {
        write!(out, ",{}", c).unwrap();
    }
    out.push('\n');

    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
    for i in 0..n_rows {
        let t = midnight + chrono::Duration::minutes(i as i64);
        write!(out, "{}", t.to_rfc3339()).unwrap();
        for _ in &cols {
            write!(out, ",{}", fill).unwrap();
        }
        out.push('\n');
    }

    let name = format!("radem_{}_{}.tab", kind.file_tag(), date.format("%Y%m%d"));
    std::fs::write(dir.join(name), out).unwrap();
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn list_paths_filters_by_kind_and_date() {
    let tmp = tempfile::tempdir().unwrap();
    write_decoded(tmp.path(), ChannelKind::Science, d(2023, 12, 1), 3, 1.0);
    write_decoded(tmp.path(), ChannelKind::Science, d(2024, 1, 31), 3, 2.0);
    write_decoded(tmp.path(), ChannelKind::Science, d(2024, 2, 15), 3, 3.0);
    write_decoded(tmp.path(), ChannelKind::Housekeeping, d(2023, 12, 1), 3, 4.0);

    let source = DecodedFileSource::default();

    let all = source
        .list_paths(tmp.path(), ChannelKind::Science, None)
        .unwrap();
    assert_eq!(all.len(), 3);

    let range = DateRange::from_strs("2023-12-01", "2024-01-31").unwrap();
    let filtered = source
        .list_paths(tmp.path(), ChannelKind::Science, Some(&range))
        .unwrap();
    assert_eq!(filtered.len(), 2);

    let hk = source
        .list_paths(tmp.path(), ChannelKind::Housekeeping, Some(&range))
        .unwrap();
    assert_eq!(hk.len(), 1);

    // Filtered listing equals the unfiltered listing restricted post hoc.
    let post_hoc: Vec<_> = all
        .iter()
        .filter(|p| {
            let name = p.file_name().unwrap().to_str().unwrap();
            radem_common::time::file_date(name)
                .map(|date| range.contains(date))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    assert_eq!(filtered, post_hoc);
}

#[test]
fn three_call_patterns_are_equivalent() {
    let tmp = tempfile::tempdir().unwrap();
    write_decoded(tmp.path(), ChannelKind::Science, d(2023, 12, 1), 10, 1.0);
    write_decoded(tmp.path(), ChannelKind::Science, d(2023, 12, 2), 10, 2.0);
    write_decoded(tmp.path(), ChannelKind::Science, d(2024, 3, 1), 10, 9.0);

    let source = DecodedFileSource::default();
    let range = DateRange::from_strs("2023-12-01", "2024-01-31").unwrap();

    let full = ingest(
        &source,
        tmp.path(),
        ChannelKind::Science,
        Some(&range),
        IngestPattern::FullDirectory,
    )
    .unwrap();
    let prefiltered = ingest(
        &source,
        tmp.path(),
        ChannelKind::Science,
        Some(&range),
        IngestPattern::PrefilteredPaths,
    )
    .unwrap();
    let combined = ingest(
        &source,
        tmp.path(),
        ChannelKind::Science,
        Some(&range),
        IngestPattern::FilteredRead,
    )
    .unwrap();

    assert_eq!(full, prefiltered);
    assert_eq!(prefiltered, combined);
    assert_eq!(full.n_rows(), 20);
    assert_eq!(full.n_cols(), 60);
}

#[test]
fn normalize_sorts_and_dedupes_across_files() {
    let tmp = tempfile::tempdir().unwrap();
    // Same date twice is not possible via filenames, so overlap comes from
    // adjacent days sharing a boundary timestamp: re-create it by merging
    // one file read twice through explicit paths.
    write_decoded(tmp.path(), ChannelKind::Housekeeping, d(2023, 12, 1), 5, 1.0);
    write_decoded(tmp.path(), ChannelKind::Housekeeping, d(2023, 12, 2), 5, 2.0);

    let source = DecodedFileSource::default();
    let paths = source
        .list_paths(tmp.path(), ChannelKind::Housekeeping, None)
        .unwrap();

    // Read day 2, day 1, then day 1 again: normalize must sort ascending
    // and collapse the duplicated day-1 rows.
    let files = source
        .read(ReadInput::Paths(vec![
            paths[1].clone(),
            paths[0].clone(),
            paths[0].clone(),
        ]))
        .unwrap();
    let table = source.normalize(files).unwrap();

    assert_eq!(table.n_rows(), 10);
    let times = table.times();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn empty_window_yields_empty_table_with_schema() {
    let tmp = tempfile::tempdir().unwrap();
    write_decoded(tmp.path(), ChannelKind::Science, d(2023, 12, 1), 3, 1.0);

    let source = DecodedFileSource::default();
    let range = DateRange::from_strs("2025-01-01", "2025-01-31").unwrap();
    let table = ingest(
        &source,
        tmp.path(),
        ChannelKind::Science,
        Some(&range),
        IngestPattern::PrefilteredPaths,
    )
    .unwrap();

    assert_eq!(table.n_rows(), 0);
    assert_eq!(table.n_cols(), 60);
    assert_eq!(table.label(), "science");
}

#[test]
fn malformed_file_is_an_error_not_a_skip() {
    let tmp = tempfile::tempdir().unwrap();
    write_decoded(tmp.path(), ChannelKind::Science, d(2023, 12, 1), 2, 1.0);
    std::fs::write(
        tmp.path().join("radem_sci_20231202.tab"),
        "time,p1\n2023-12-02T00:00:00Z,not-a-number\n",
    )
    .unwrap();

    let source = DecodedFileSource::default();
    let result = source.read(ReadInput::Directory {
        root: tmp.path().to_path_buf(),
        kind: ChannelKind::Science,
    });
    assert!(result.is_err());
}

#[test]
fn schema_mismatch_is_detected() {
    let tmp = tempfile::tempdir().unwrap();
    // Housekeeping header under a science filename.
    let mut out = String::from("time");
    for c in ChannelKind::Housekeeping.columns() {
        out.push(',');
        out.push_str(&c);
    }
    out.push('\n');
    std::fs::write(tmp.path().join("radem_sci_20231201.tab"), out).unwrap();

    let source = DecodedFileSource::default();
    let err = source
        .read(ReadInput::Paths(vec![
            tmp.path().join("radem_sci_20231201.tab")
        ]))
        .unwrap_err();
    assert!(matches!(
        err,
        radem_ingest::IngestError::SchemaMismatch { .. }
    ));
}
