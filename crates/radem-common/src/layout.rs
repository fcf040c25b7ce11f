//! Data-directory layout for a pipeline run.
//!
//! The layout is a convention shared with the upstream tooling: `raw/`,
//! `extracted/`, `hdf5/` and `csv/` under a single configurable data root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory layout under the data root.
///
/// Each stage exclusively owns its output directory; nothing here enforces
/// that beyond convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mirrored upstream archives, organized by source and date.
    pub fn raw(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// Stable location-independent pointer to the mirrored subtree.
    pub fn raw_latest(&self) -> PathBuf {
        self.raw().join("latest")
    }

    /// Decompressed decoded-record files (flat).
    pub fn extracted(&self) -> PathBuf {
        self.root.join("extracted")
    }

    /// Binary keyed table stores. The directory name is kept from the
    /// upstream convention even though the container format is our own.
    pub fn hdf5(&self) -> PathBuf {
        self.root.join("hdf5")
    }

    /// Delimited text table stores.
    pub fn csv(&self) -> PathBuf {
        self.root.join("csv")
    }

    /// Create every stage directory that does not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [self.raw(), self.extracted(), self.hdf5(), self.csv()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
