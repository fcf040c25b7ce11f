//! Channel kinds and their column schemas.
//!
//! The instrument produces two record categories with different schemas:
//! science counts (particle channel bins) and housekeeping (temperatures,
//! voltages, currents). The schemas are fixed per kind; every decoded file
//! of a kind carries exactly these columns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Instrument data channel category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Particle channel bin counts.
    Science,
    /// Instrument temperatures, voltages and currents.
    Housekeeping,
}

impl ChannelKind {
    /// Tag embedded in decoded-record filenames (`radem_<tag>_<date>`).
    pub fn file_tag(&self) -> &'static str {
        match self {
            ChannelKind::Science => "sci",
            ChannelKind::Housekeeping => "hk",
        }
    }

    /// Detect the kind from a decoded-record filename.
    pub fn from_filename(filename: &str) -> Option<ChannelKind> {
        let stem = filename.split('.').next()?;
        let mut parts = stem.split('_');
        if parts.next() != Some("radem") {
            return None;
        }
        match parts.next() {
            Some("sci") => Some(ChannelKind::Science),
            Some("hk") => Some(ChannelKind::Housekeeping),
            _ => None,
        }
    }

    /// The fixed column schema for this kind, in file order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            ChannelKind::Science => science_columns(),
            ChannelKind::Housekeeping => housekeeping_columns(),
        }
    }

    /// An empty [`ChannelTable`] carrying this kind's schema.
    pub fn empty_table(&self) -> radem_common::table::ChannelTable {
        radem_common::table::ChannelTable::new(self.to_string(), self.columns())
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Science => write!(f, "science"),
            ChannelKind::Housekeeping => write!(f, "housekeeping"),
        }
    }
}

/// Science schema: 8 proton bins, 9 electron bins, 31 directional-detector
/// bins and 12 heavy-ion bins (60 columns).
fn science_columns() -> Vec<String> {
    let mut cols = Vec::with_capacity(60);
    cols.extend((1..=8).map(|i| format!("p{}", i)));
    cols.extend((1..=9).map(|i| format!("e{}", i)));
    cols.extend((1..=31).map(|i| format!("dd{}", i)));
    cols.extend((1..=12).map(|i| format!("hi{}", i)));
    cols
}

/// Housekeeping schema: sensor head and electronics temperatures, supply
/// voltages and currents (12 columns).
fn housekeeping_columns() -> Vec<String> {
    [
        "t_ceu", "t_pdu", "t_head_p", "t_head_e", "t_head_dd", "t_head_hi",
        "v_3v3", "v_5v", "v_hv_bias", "i_3v3", "i_5v", "i_hv_bias",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
