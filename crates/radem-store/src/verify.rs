//! Write → immediate read-back verification.
//!
//! The pipeline asserts round-trip equality right after persisting a table.
//! A mismatch is surfaced as an explicit error; nothing is corrected
//! automatically.

use std::path::Path;

use radem_common::table::ChannelTable;

use crate::binary::BinaryStore;
use crate::error::{Result, StoreError};
use crate::text::read_csv;

/// Tolerance for text round-trip comparison. Decimal serialization may lose
/// the last representable digits; this is accepted, documented behavior.
pub const TEXT_TOLERANCE: f64 = 1e-12;

/// Reload `key` from a binary store file and check exact equality against
/// the original table, element for element, time index included.
pub fn verify_binary_roundtrip(path: &Path, key: &str, original: &ChannelTable) -> Result<()> {
    let store = BinaryStore::load(path)?;
    let reloaded = store
        .get(key)
        .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;

    if !tables_identical(original, reloaded) {
        return Err(StoreError::RoundTrip(format!(
            "binary store {} key {} does not reproduce the original table",
            path.display(),
            key
        )));
    }
    Ok(())
}

/// Reload a CSV table and check equality within [`TEXT_TOLERANCE`].
pub fn verify_text_roundtrip(path: &Path, original: &ChannelTable) -> Result<()> {
    let reloaded = read_csv(path, original.label())?;
    if !original.approx_eq(&reloaded, TEXT_TOLERANCE) {
        return Err(StoreError::RoundTrip(format!(
            "text store {} differs from the original beyond tolerance",
            path.display()
        )));
    }
    Ok(())
}

/// Bit-exact table comparison (NaN equal to NaN).
fn tables_identical(a: &ChannelTable, b: &ChannelTable) -> bool {
    if a.label() != b.label()
        || a.times() != b.times()
        || a.column_names() != b.column_names()
    {
        return false;
    }
    (0..a.n_cols()).all(|c| {
        let (x, y) = (a.column_at(c), b.column_at(c));
        x.len() == y.len() && x.iter().zip(y).all(|(p, q)| p.to_bits() == q.to_bits())
    })
}
