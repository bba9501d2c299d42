//! # Batch Driver
//!
//! Finds candidate artifacts under a root directory and runs the re-encoder once
//! per file, sequentially, collecting a [`BatchReport`].
//!
//! The walk is sorted by file name, does not follow symlinks, prunes directories
//! whose name is in the configured exclusion set and keeps only files with a
//! recognized extension. A missing or unreadable root aborts the batch before any
//! artifact is processed; unreadable entries below the root are logged and skipped.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::artifact::to_kb;
use crate::codec::ImageCodec;
use crate::config::CompressConfig;
use crate::error::{CompressError, CompressResult};
use crate::outcome::CompressionOutcome;
use crate::reencoder::Reencoder;

/// Aggregated outcomes of one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub total: usize,
    pub compressed: usize,
    pub unchanged: usize,
    pub unsupported: usize,
    pub failed: usize,
    /// Artifacts that stayed over budget, with the size of the last attempt in bytes.
    pub oversized: Vec<(PathBuf, u64)>,
    pub bytes_saved: u64,
}

impl BatchReport {
    /// Fold one outcome into the counters.
    pub fn record(&mut self, path: &Path, outcome: &CompressionOutcome) {
        self.total += 1;
        match outcome {
            CompressionOutcome::Unchanged { .. } => self.unchanged += 1,
            CompressionOutcome::Compressed {
                original_bytes,
                final_bytes,
                ..
            } => {
                self.compressed += 1;
                self.bytes_saved += original_bytes.saturating_sub(*final_bytes);
            }
            CompressionOutcome::Unsupported { .. } => self.unsupported += 1,
            CompressionOutcome::Failed { .. } => self.failed += 1,
            CompressionOutcome::StillOversized { final_bytes } => {
                self.oversized.push((path.to_path_buf(), *final_bytes))
            }
        }
    }

    /// True when at least one artifact is still over budget.
    pub fn has_oversized(&self) -> bool {
        !self.oversized.is_empty()
    }

    /// Whether the run should exit non-zero under `fail_on_oversized`.
    pub fn should_fail(&self, fail_on_oversized: bool) -> bool {
        fail_on_oversized && self.has_oversized()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "total": self.total,
            "compressed": self.compressed,
            "unchanged": self.unchanged,
            "unsupported": self.unsupported,
            "failed": self.failed,
            "bytes_saved": self.bytes_saved,
            "oversized": self.oversized.iter().map(|(path, size)| json!({
                "path": path.display().to_string(),
                "size_kb": (to_kb(*size) * 10.0).round() / 10.0,
            })).collect::<Vec<_>>(),
        })
    }
}

/// List every artifact under `config.root` that the batch should evaluate.
pub fn discover(config: &CompressConfig) -> CompressResult<Vec<PathBuf>> {
    let root = &config.root;
    let walk_error = |reason: String| {
        CompressError::walk(root, reason)
            .with_recovery_suggestion("point --dir or IMAGE_DIR at an existing, readable directory")
    };
    let metadata = std::fs::metadata(root).map_err(|e| walk_error(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(walk_error("not a directory".into()));
    }
    std::fs::read_dir(root).map_err(|e| walk_error(e.to_string()))?;

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| config.is_excluded_dir(name))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let recognized = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.is_recognized_extension(ext));
        if recognized {
            found.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), count = found.len(), "discovered artifacts");
    Ok(found)
}

/// Runs the re-encoder over a list of artifacts.
pub struct BatchDriver<'a, C: ImageCodec> {
    reencoder: Reencoder<'a, C>,
}

impl<'a, C: ImageCodec> BatchDriver<'a, C> {
    pub fn new(reencoder: Reencoder<'a, C>) -> Self {
        Self { reencoder }
    }

    pub fn reencoder(&self) -> &Reencoder<'a, C> {
        &self.reencoder
    }

    /// Evaluate each path once, in order, calling `on_outcome` after every artifact.
    pub fn run<F>(&self, paths: &[PathBuf], mut on_outcome: F) -> BatchReport
    where
        F: FnMut(&Path, &CompressionOutcome),
    {
        let mut report = BatchReport::default();
        for path in paths {
            let outcome = self.reencoder.evaluate_path(path);
            on_outcome(path, &outcome);
            report.record(path, &outcome);
        }
        report
    }

    /// Discover artifacts under the configured root and evaluate them.
    pub fn run_root<F>(&self, on_outcome: F) -> CompressResult<BatchReport>
    where
        F: FnMut(&Path, &CompressionOutcome),
    {
        let paths = discover(self.reencoder.config())?;
        Ok(self.run(&paths, on_outcome))
    }
}
