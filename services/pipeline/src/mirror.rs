//! Acquire stage: mirror the upstream archive tree.
//!
//! Lists the remote tree, keeps files matching the configured suffix, and
//! fetches each one unless the local copy is at least as new as the remote
//! (`RefreshPolicy::SkipIfPresent`). Directory structure below the remote
//! prefix is preserved. Failures are non-fatal: they go to the log and to a
//! `mirror.log` side artifact, and the run continues; a partial mirror is
//! valid and resumable.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Context, Result};
use futures::TryStreamExt;
use object_store::http::HttpBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{aws::AmazonS3Builder, ObjectMeta, ObjectStore};
use radem_common::DataLayout;
use tracing::{info, warn};

use crate::config::SourceConfig;

/// Outcome of one mirror pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct MirrorReport {
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Build an object store for the source URL: http(s), s3, or a local
/// directory path.
fn build_store(source: &SourceConfig) -> Result<Box<dyn ObjectStore>> {
    let url = source.url.as_str();
    if url.starts_with("http://") || url.starts_with("https://") {
        let store = HttpBuilder::new()
            .with_url(url)
            .build()
            .with_context(|| format!("Failed to create HTTP store for {}", url))?;
        Ok(Box::new(store))
    } else if url.starts_with("s3://") {
        let store = AmazonS3Builder::from_env()
            .with_url(url)
            .build()
            .with_context(|| format!("Failed to create S3 store for {}", url))?;
        Ok(Box::new(store))
    } else {
        let store = LocalFileSystem::new_with_prefix(url)
            .with_context(|| format!("Failed to open local source directory {}", url))?;
        Ok(Box::new(store))
    }
}

/// Mirror the source into `<data_root>/raw/<source_id>/`.
pub async fn mirror(source: &SourceConfig, layout: &DataLayout) -> Result<MirrorReport> {
    let store = build_store(source)?;
    mirror_with_store(store.as_ref(), source, layout).await
}

async fn mirror_with_store(
    store: &dyn ObjectStore,
    source: &SourceConfig,
    layout: &DataLayout,
) -> Result<MirrorReport> {
    let dest_root = layout.raw().join(&source.id);
    std::fs::create_dir_all(&dest_root)?;

    let prefix = if source.prefix.is_empty() {
        None
    } else {
        Some(StorePath::from(source.prefix.as_str()))
    };

    info!(
        source = %source.id,
        url = %source.url,
        suffix = %source.suffix,
        "Starting mirror pass"
    );

    let mut report = MirrorReport::default();
    let mut failure_log = FailureLog::new(layout.raw().join("mirror.log"));

    let mut listing = store.list(prefix.as_ref());
    loop {
        let meta = match listing.try_next().await {
            Ok(Some(meta)) => meta,
            Ok(None) => break,
            Err(e) => {
                // A broken stream may never make progress; one listing error
                // ends the pass. Objects already handled keep their results.
                report.failed += 1;
                failure_log.record("<listing>", &e.to_string())?;
                warn!(error = %e, "Listing error during mirror, ending pass");
                break;
            }
        };

        if !meta.location.as_ref().ends_with(&source.suffix) {
            continue;
        }

        let local_path = match local_path_for(&dest_root, prefix.as_ref(), &meta.location) {
            Ok(path) => path,
            Err(e) => {
                report.failed += 1;
                failure_log.record(meta.location.as_ref(), &e.to_string())?;
                continue;
            }
        };

        if is_up_to_date(&local_path, &meta) {
            report.skipped += 1;
            continue;
        }

        match fetch_one(store, &meta, &local_path).await {
            Ok(()) => {
                report.fetched += 1;
                info!(
                    remote = %meta.location,
                    local = %local_path.display(),
                    bytes = meta.size,
                    "Mirrored archive"
                );
            }
            Err(e) => {
                report.failed += 1;
                failure_log.record(meta.location.as_ref(), &e.to_string())?;
                warn!(remote = %meta.location, error = %e, "Mirror fetch failed, continuing");
            }
        }
    }

    refresh_latest_link(layout, &dest_root)?;

    info!(
        fetched = report.fetched,
        skipped = report.skipped,
        failed = report.failed,
        "Mirror pass complete"
    );
    Ok(report)
}

/// Local destination preserving the remote structure below the prefix.
fn local_path_for(
    dest_root: &Path,
    prefix: Option<&StorePath>,
    location: &StorePath,
) -> Result<PathBuf> {
    let full = location.as_ref();
    let relative = match prefix {
        Some(p) => full
            .strip_prefix(p.as_ref())
            .map(|s| s.trim_start_matches('/'))
            .ok_or_else(|| anyhow!("object {} outside prefix {}", full, p))?,
        None => full,
    };
    if relative.is_empty() {
        return Err(anyhow!("object path {} reduces to an empty name", full));
    }
    Ok(dest_root.join(relative))
}

/// Skip-if-present: the local copy counts as current when its mtime is at
/// least the remote last-modified timestamp.
fn is_up_to_date(local: &Path, meta: &ObjectMeta) -> bool {
    let Ok(fs_meta) = std::fs::metadata(local) else {
        return false;
    };
    let Ok(mtime) = fs_meta.modified() else {
        return false;
    };
    let remote: SystemTime = meta.last_modified.into();
    mtime >= remote
}

async fn fetch_one(store: &dyn ObjectStore, meta: &ObjectMeta, local: &Path) -> Result<()> {
    if let Some(parent) = local.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = store
        .get(&meta.location)
        .await
        .context("GET failed")?
        .bytes()
        .await
        .context("Body read failed")?;
    std::fs::write(local, &bytes).context("Local write failed")?;
    Ok(())
}

/// Stable location-independent pointer to the mirrored subtree.
fn refresh_latest_link(layout: &DataLayout, dest_root: &Path) -> Result<()> {
    let link = layout.raw_latest();
    if std::fs::symlink_metadata(&link).is_ok() {
        std::fs::remove_file(&link)
            .with_context(|| format!("Failed to replace {}", link.display()))?;
    }
    std::os::unix::fs::symlink(dest_root, &link)
        .with_context(|| format!("Failed to link {} -> {}", link.display(), dest_root.display()))?;
    Ok(())
}

/// Append-only side artifact for mirror failures. Opened lazily so a clean
/// run leaves no log behind.
struct FailureLog {
    path: PathBuf,
    file: Option<std::fs::File>,
}

impl FailureLog {
    fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    fn record(&mut self, location: &str, error: &str) -> Result<()> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .with_context(|| format!("Failed to open {}", self.path.display()))?;
                self.file.insert(file)
            }
        };
        writeln!(
            file,
            "{}\t{}\t{}",
            chrono::Utc::now().to_rfc3339(),
            location,
            error
        )?;
        Ok(())
    }
}
