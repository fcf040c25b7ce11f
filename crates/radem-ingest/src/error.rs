//! Error types for the ingestion crate.

use std::path::PathBuf;

use radem_common::table::TableError;
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Column schema of {path} does not match the {kind} schema")]
    SchemaMismatch { path: PathBuf, kind: String },

    #[error("Unrecognized decoded-record filename: {0}")]
    UnknownFile(PathBuf),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
