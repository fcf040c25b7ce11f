//! Ingest stage: parse decoded records, normalize, persist, verify.
//!
//! For each configured channel kind: run the chosen call pattern over the
//! extracted directory, normalize into one table, write it to the shared
//! binary store under the kind's key and to a per-kind CSV file, then read
//! both back and check the round trips. Parse failures propagate unchanged;
//! a round-trip mismatch is an explicit error, never silently corrected.

use anyhow::{Context, Result};
use radem_common::DataLayout;
use radem_ingest::{ingest, DecodedFileSource, RecordSource};
use radem_store::{
    verify_binary_roundtrip, verify_text_roundtrip, write_csv, BinaryStore,
};
use tracing::info;

use crate::config::PipelineConfig;

/// Run the ingest stage for every configured kind.
pub fn run_ingest(config: &PipelineConfig, layout: &DataLayout) -> Result<()> {
    let source = DecodedFileSource::new(config.ingest.extension.clone());
    let extracted = layout.extracted();
    let range = config.date_range();

    let mut store = BinaryStore::new();
    let mut csv_paths = Vec::new();

    for kind in &config.ingest.kinds {
        let table = ingest(
            &source as &dyn RecordSource,
            &extracted,
            *kind,
            range.as_ref(),
            config.ingest.pattern,
        )
        .with_context(|| format!("Ingest failed for {} channels", kind))?;

        info!(
            kind = %kind,
            rows = table.n_rows(),
            cols = table.n_cols(),
            "Normalized channel table"
        );

        let csv_path = layout.csv().join(format!("radem_{}.csv", kind.file_tag()));
        write_csv(&table, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        csv_paths.push((csv_path, table.clone()));

        store
            .insert(kind.to_string(), table)
            .context("Duplicate kind in ingest configuration")?;
    }

    let binary_path = layout.hdf5().join(&config.store.binary_file);
    store
        .save(&binary_path)
        .with_context(|| format!("Failed to write {}", binary_path.display()))?;

    // Immediate read-back verification: exact for the binary store,
    // tolerance-bounded for the text form.
    for key in config.ingest.kinds.iter().map(|k| k.to_string()) {
        let original = store
            .get(&key)
            .with_context(|| format!("Table {} missing after insert", key))?;
        verify_binary_roundtrip(&binary_path, &key, original)
            .with_context(|| format!("Binary round-trip failed for {}", key))?;
    }
    for (csv_path, original) in &csv_paths {
        verify_text_roundtrip(csv_path, original)
            .with_context(|| format!("Text round-trip failed for {}", csv_path.display()))?;
    }

    info!(
        store = %binary_path.display(),
        tables = store.len(),
        "Ingest complete, round trips verified"
    );
    Ok(())
}
