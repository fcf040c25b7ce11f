//! Error types shared by the pipeline crates.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors from the shared utility layer.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvertedRange { start: String, end: String },
}
