//! Common types and utilities shared across all radem-pipeline crates.

pub mod error;
pub mod layout;
pub mod policy;
pub mod table;
pub mod time;

pub use error::{CommonError, CommonResult};
pub use layout::DataLayout;
pub use policy::RefreshPolicy;
pub use table::{ChannelTable, TableError};
pub use time::{file_date, parse_date, parse_datetime, DateRange};
