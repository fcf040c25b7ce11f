//! Trajectory collaborator boundary.
//!
//! Ephemeris computation, kernel download and caching all belong to an
//! external collaborator; this crate only defines the query/sample types,
//! the provider trait, and a provider backed by sample files the external
//! tool exports. Consumers see nothing but numeric sequences.

pub mod error;
mod provider;
mod series;

pub use error::{Result, TrajectoryError};
pub use provider::{read_export, EphemerisProvider, TabulatedEphemeris};
pub use series::{samples_to_table, TrajectoryQuery, TrajectorySample};
