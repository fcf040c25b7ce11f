//! Instrument data ingestion library.
//!
//! Provides the parsing boundary between decoded instrument record files and
//! in-memory channel tables:
//!
//! - Channel kinds (science vs housekeeping) with their fixed column schemas
//! - `ChannelTable`: time-indexed, named-column numeric tables
//! - `RecordSource`: the narrow `list_paths` / `read` / `normalize` interface,
//!   with a concrete reader for the decoded delimited record format
//!
//! CDF decoding is out of scope here; this crate consumes the decoded
//! representation produced by the extract stage.

pub mod error;
mod kind;
mod source;

pub use error::{IngestError, Result};
pub use kind::ChannelKind;
pub use radem_common::table::ChannelTable;
pub use source::{ingest, DecodedFileSource, IngestPattern, ReadInput, RecordFile, RecordSource};
