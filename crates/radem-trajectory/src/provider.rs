//! Ephemeris providers.
//!
//! The real ephemeris computation happens in an external tool that manages
//! its own kernels; this module defines the async boundary plus a provider
//! that serves samples from a file that tool exported.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use radem_common::time::parse_datetime;
use tracing::debug;

use crate::error::{Result, TrajectoryError};
use crate::series::{TrajectoryQuery, TrajectorySample};

/// Source of trajectory samples for a query.
#[async_trait]
pub trait EphemerisProvider: Send + Sync {
    /// Per-sample distance and angular coordinates of the observer relative
    /// to the target over the query window.
    async fn coverage(&self, query: &TrajectoryQuery) -> Result<Vec<TrajectorySample>>;
}

/// Provider backed by an ephemeris export file.
///
/// The external tool exports CSV with columns
/// `time,distance_km,lat_deg,lon_deg`; `coverage` returns the tabulated
/// samples falling inside the query window. The sampling interval is
/// whatever the export used; `query.step` is not re-sampled here.
#[derive(Debug, Clone)]
pub struct TabulatedEphemeris {
    path: PathBuf,
}

impl TabulatedEphemeris {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<TrajectorySample>> {
        read_export(&self.path)
    }
}

#[async_trait]
impl EphemerisProvider for TabulatedEphemeris {
    async fn coverage(&self, query: &TrajectoryQuery) -> Result<Vec<TrajectorySample>> {
        let all = self.load()?;
        let samples: Vec<TrajectorySample> = all
            .into_iter()
            .filter(|s| s.time >= query.start && s.time <= query.stop)
            .collect();
        debug!(
            observer = %query.observer,
            target = %query.target,
            samples = samples.len(),
            "Tabulated ephemeris coverage"
        );
        Ok(samples)
    }
}

/// Parse an ephemeris export file.
pub fn read_export(path: &Path) -> Result<Vec<TrajectorySample>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| TrajectoryError::ParseExport(format!("{}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| TrajectoryError::ParseExport(e.to_string()))?;
    let expected = ["time", "distance_km", "lat_deg", "lon_deg"];
    if headers.len() != expected.len() || !headers.iter().zip(expected).all(|(h, e)| h == e) {
        return Err(TrajectoryError::ParseExport(format!(
            "{}: unexpected header {:?}",
            path.display(),
            headers
        )));
    }

    let mut samples = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| TrajectoryError::ParseExport(e.to_string()))?;
        let field = |i: usize| -> Result<f64> {
            record[i].parse::<f64>().map_err(|_| {
                TrajectoryError::ParseExport(format!(
                    "{}: row {}: invalid number {:?}",
                    path.display(),
                    idx + 1,
                    &record[i]
                ))
            })
        };
        samples.push(TrajectorySample {
            time: parse_datetime(&record[0]).map_err(|e| {
                TrajectoryError::ParseExport(format!(
                    "{}: row {}: {}",
                    path.display(),
                    idx + 1,
                    e
                ))
            })?,
            distance_km: field(1)?,
            lat_deg: field(2)?,
            lon_deg: field(3)?,
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, 0, 0).unwrap()
    }

    fn write_export(path: &Path, hours: &[u32]) {
        let mut out = String::from("time,distance_km,lat_deg,lon_deg\n");
        for h in hours {
            out.push_str(&format!(
                "{},{},{},{}\n",
                t(*h).to_rfc3339(),
                1.0e8 + *h as f64,
                -1.0,
                30.0 + *h as f64
            ));
        }
        std::fs::write(path, out).unwrap();
    }

    #[tokio::test]
    async fn test_coverage_windows_tabulated_samples() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("juice_earth.csv");
        write_export(&path, &[0, 1, 2, 3, 4, 5]);

        let provider = TabulatedEphemeris::new(&path);
        let query =
            TrajectoryQuery::new("JUICE", "Earth", t(1), t(3), Duration::hours(1)).unwrap();

        let samples = provider.coverage(&query).await.unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].time, t(1));
        assert_eq!(samples[2].time, t(3));
        assert_eq!(samples[2].distance_km, 1.0e8 + 3.0);
    }

    #[tokio::test]
    async fn test_bad_export_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(&path, "time,range_km\n2024-06-01T00:00:00Z,1\n").unwrap();

        let provider = TabulatedEphemeris::new(&path);
        let query =
            TrajectoryQuery::new("JUICE", "Earth", t(0), t(1), Duration::hours(1)).unwrap();
        assert!(provider.coverage(&query).await.is_err());
    }
}
