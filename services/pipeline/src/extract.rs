//! Extract stage: decompress mirrored archives into decoded record files.
//!
//! Every archive under the raw directory whose name ends in the compression
//! suffix is decompressed into a flat output directory. The output name is
//! the archive name with exactly that suffix stripped. Unlike Acquire, the
//! pipeline runs this stage with `RefreshPolicy::AlwaysOverwrite`, so an
//! existing output is regenerated and the overwrite logged as a notice.
//! Files are processed in lexicographic path order so runs are
//! deterministic.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use radem_common::RefreshPolicy;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Outcome of one extract pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractReport {
    pub extracted: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// Decompress every `*<suffix>` archive under `raw_dir` into `out_dir`.
///
/// The pipeline runs this with [`RefreshPolicy::AlwaysOverwrite`]: decoded
/// files are regenerated on every pass.
pub fn extract(
    raw_dir: &Path,
    out_dir: &Path,
    suffix: &str,
    policy: RefreshPolicy,
) -> Result<ExtractReport> {
    std::fs::create_dir_all(out_dir)?;

    // Symlinks are not followed: the stable `latest` link points back into
    // the raw tree and following it would process every archive twice.
    let mut archives: Vec<PathBuf> = WalkDir::new(raw_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    archives.sort();

    let mut report = ExtractReport::default();
    for archive in &archives {
        let name = archive
            .file_name()
            .and_then(|n| n.to_str())
            .context("non-UTF-8 archive name")?;
        let stem = name
            .strip_suffix(suffix)
            .context("archive lost its suffix mid-run")?;
        if stem.is_empty() {
            bail!("archive name {} is only the compression suffix", name);
        }
        let out_path = out_dir.join(stem);

        if out_path.exists() {
            if !policy.overwrites() {
                debug!(path = %out_path.display(), "Output exists, skipping");
                report.skipped += 1;
                continue;
            }
            // Overwriting under AlwaysOverwrite is a notice, not an error.
            info!(path = %out_path.display(), "Output exists, overwriting");
            report.overwritten += 1;
        }

        decompress_file(archive, &out_path)
            .with_context(|| format!("Failed to extract {}", archive.display()))?;
        report.extracted += 1;
        debug!(archive = %archive.display(), out = %out_path.display(), "Extracted archive");
    }

    info!(
        extracted = report.extracted,
        overwritten = report.overwritten,
        skipped = report.skipped,
        "Extract pass complete"
    );
    Ok(report)
}

fn decompress_file(archive: &Path, out_path: &Path) -> Result<()> {
    let input = File::open(archive)?;
    let mut decoder = GzDecoder::new(input);
    let mut output = File::create(out_path)?;
    std::io::copy(&mut decoder, &mut output)?;
    Ok(())
}
