//! Time handling utilities for instrument data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// An inclusive calendar-date range used to select decoded files by their
/// embedded date before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CommonError> {
        if start > end {
            return Err(CommonError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse from two `YYYY-MM-DD` strings.
    pub fn from_strs(start: &str, end: &str) -> Result<Self, CommonError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Both boundaries are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CommonError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CommonError::InvalidDate(s.to_string()))
}

/// Parse an ISO 8601 timestamp, assuming UTC when no offset is given.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CommonError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(CommonError::InvalidTime(s.to_string()))
}

/// Extract the `YYYYMMDD` date embedded in a decoded-record filename.
///
/// Decoded files are named `radem_<tag>_<YYYYMMDD>` plus an extension,
/// e.g. `radem_sci_20231201.tab`. Returns `None` when no date component
/// parses, rather than guessing.
pub fn file_date(filename: &str) -> Option<NaiveDate> {
    let stem = filename.split('.').next()?;

    for part in stem.split('_') {
        if part.len() == 8 && part.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(date) = NaiveDate::parse_from_str(part, "%Y%m%d") {
                return Some(date);
            }
        }
    }

    None
}
