//! Error types for the trajectory crate.

use thiserror::Error;

/// Errors from trajectory queries and sample handling.
#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Failed to parse ephemeris export: {0}")]
    ParseExport(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Table(#[from] radem_common::table::TableError),
}

/// Result type for trajectory operations.
pub type Result<T> = std::result::Result<T, TrajectoryError>;
