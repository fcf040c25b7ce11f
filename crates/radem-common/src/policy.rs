//! Refresh policies for stage outputs.

use serde::{Deserialize, Serialize};

/// What a stage does when its output already exists.
///
/// Acquire skips archives whose local copy is at least as new as the remote
/// one; Extract always overwrites existing decoded files and logs a notice.
/// The asymmetry is deliberate and the two policies stay independently named
/// rather than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Keep the existing output when it is up to date.
    SkipIfPresent,
    /// Always regenerate, overwriting any existing output.
    AlwaysOverwrite,
}

impl RefreshPolicy {
    pub fn overwrites(&self) -> bool {
        matches!(self, RefreshPolicy::AlwaysOverwrite)
    }
}
