//! Pipeline configuration.
//!
//! One YAML file describes a whole run: upstream source, data root, the
//! optional date window, ingest choices and store file names. The config is
//! loaded and validated once at startup and passed immutably into each
//! stage; nothing mutates it mid-run.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use radem_common::time::DateRange;
use radem_ingest::{ChannelKind, IngestPattern};
use serde::Deserialize;
use tracing::debug;

/// Root configuration loaded from the pipeline YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    /// Data root; `raw/`, `extracted/`, `hdf5/` and `csv/` live below it.
    pub data_root: PathBuf,
    /// Optional inclusive date window for ingest.
    #[serde(default)]
    pub window: Option<WindowConfig>,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Upstream archive source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Short identifier; the mirrored subtree lands under `raw/<id>/`.
    pub id: String,
    /// Remote root: `https://...`, `s3://...` or a local directory path.
    pub url: String,
    /// Prefix below the remote root to mirror.
    #[serde(default)]
    pub prefix: String,
    /// Only files with this suffix are mirrored.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_suffix() -> String {
    ".gz".to_string()
}

/// Inclusive calendar-date window.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Ingest stage choices.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Channel kinds to ingest.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<ChannelKind>,
    /// Which of the three equivalent call patterns to use.
    #[serde(default = "default_pattern")]
    pub pattern: IngestPattern,
    /// Extension of decoded record files.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            pattern: default_pattern(),
            extension: default_extension(),
        }
    }
}

fn default_kinds() -> Vec<ChannelKind> {
    vec![ChannelKind::Science, ChannelKind::Housekeeping]
}

fn default_pattern() -> IngestPattern {
    IngestPattern::PrefilteredPaths
}

fn default_extension() -> String {
    "tab".to_string()
}

/// Store file naming.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Binary store filename under `hdf5/`; all kinds share one file under
    /// distinct keys.
    #[serde(default = "default_binary_file")]
    pub binary_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            binary_file: default_binary_file(),
        }
    }
}

fn default_binary_file() -> String {
    "radem.rdtb".to_string()
}

impl PipelineConfig {
    /// Load a pipeline configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        debug!(source = %config.source.id, path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Validate once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.source.id.is_empty() {
            bail!("source.id must not be empty");
        }
        if self.source.url.is_empty() {
            bail!("source.url must not be empty");
        }
        if self.source.suffix.is_empty() {
            bail!("source.suffix must not be empty");
        }
        if self.ingest.kinds.is_empty() {
            bail!("ingest.kinds must list at least one channel kind");
        }
        if let Some(window) = &self.window {
            if window.start > window.end {
                bail!(
                    "window.start {} is after window.end {}",
                    window.start,
                    window.end
                );
            }
        }
        Ok(())
    }

    /// The ingest date range, when a window is configured.
    pub fn date_range(&self) -> Option<DateRange> {
        // validate() already checked ordering
        self.window
            .as_ref()
            .and_then(|w| DateRange::new(w.start, w.end).ok())
    }
}
