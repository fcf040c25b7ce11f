//! Trajectory export: window samples from an ephemeris export and persist
//! them as a table through the regular stores.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use radem_common::DataLayout;
use radem_store::{verify_text_roundtrip, write_csv};
use radem_trajectory::{samples_to_table, EphemerisProvider, TabulatedEphemeris, TrajectoryQuery};
use tracing::info;

/// Fetch coverage for the query window and write it as a CSV table under
/// the data root.
pub async fn run_trajectory(
    layout: &DataLayout,
    ephemeris: &Path,
    observer: &str,
    target: &str,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    step_minutes: i64,
) -> Result<()> {
    let query = TrajectoryQuery::new(
        observer,
        target,
        start,
        stop,
        Duration::minutes(step_minutes),
    )?;
    let provider = TabulatedEphemeris::new(ephemeris);

    let samples = provider
        .coverage(&query)
        .await
        .context("Ephemeris coverage failed")?;
    info!(
        observer = %query.observer,
        target = %query.target,
        samples = samples.len(),
        "Fetched trajectory coverage"
    );

    let label = format!(
        "{}_{}",
        query.observer.to_lowercase(),
        query.target.to_lowercase()
    );
    let table = samples_to_table(&label, &samples)?;

    let csv_path = layout.csv().join(format!("{}.csv", label));
    write_csv(&table, &csv_path)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    verify_text_roundtrip(&csv_path, &table)
        .with_context(|| format!("Text round-trip failed for {}", csv_path.display()))?;

    info!(path = %csv_path.display(), rows = table.n_rows(), "Wrote trajectory table");
    Ok(())
}
