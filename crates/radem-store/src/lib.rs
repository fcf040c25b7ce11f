//! Persistence for channel tables.
//!
//! Two store forms with deliberately different round-trip guarantees:
//!
//! - [`binary`]: a keyed binary columnar container. Multiple tables coexist
//!   in one file under distinct keys; numeric values, timestamps and column
//!   order round-trip exactly (NaN included).
//! - [`text`]: one delimited text file per table, header row plus one row
//!   per timestamp. Reload is only guaranteed up to decimal serialization
//!   precision, which is documented behavior rather than a defect.
//!
//! [`verify`] reads a store back immediately after writing and reports any
//! mismatch as an explicit error.

pub mod binary;
pub mod error;
pub mod text;
pub mod verify;

pub use binary::BinaryStore;
pub use error::{Result, StoreError};
pub use text::{read_csv, write_csv};
pub use verify::{verify_binary_roundtrip, verify_text_roundtrip, TEXT_TOLERANCE};
