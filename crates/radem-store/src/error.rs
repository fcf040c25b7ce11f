//! Error types for the store crate.

use thiserror::Error;

/// Errors that can occur persisting or reloading tables.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Not a table store file (bad magic)")]
    BadMagic,

    #[error("Unsupported store format version: {0}")]
    UnsupportedVersion(u16),

    #[error("Store file is truncated or corrupt: {0}")]
    Corrupt(String),

    #[error("Checksum mismatch for table {key}")]
    ChecksumMismatch { key: String },

    #[error("No table stored under key: {0}")]
    KeyNotFound(String),

    #[error("A table is already stored under key: {0}")]
    DuplicateKey(String),

    #[error("Invalid text table: {0}")]
    InvalidText(String),

    #[error("Round-trip verification failed: {0}")]
    RoundTrip(String),

    #[error(transparent)]
    Table(#[from] radem_common::table::TableError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
