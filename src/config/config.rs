//! # Run Configuration
//!
//! Immutable configuration shared by the re-encoder and the batch driver. It is
//! built once by the CLI (flags take precedence over environment variables) and
//! passed by reference; nothing reads ambient global state after start-up.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `max_size_kb` | `u64` | 500 | Size budget in kilobytes (1 KB = 1024 bytes) |
//! | `quality` | `u8` | 60 | First quality level tried (0-100) |
//! | `min_quality` | `u8` | 20 | Ladder floor |
//! | `quality_step` | `u8` | 5 | Decrement between ladder levels |
//! | `max_iterations` | `usize` | 5 | Maximum encode attempts per artifact |
//! | `root` | `PathBuf` | `.` | Directory to scan |
//! | `fail_on_oversized` | `bool` | true | Non-zero exit when an artifact stays over budget |
//! | `max_dimension` | `Option<u32>` | `None` | Optional longest-side downscale before encoding |
//! | `excluded_dirs` | `BTreeSet<String>` | build/dependency dirs | Directory names skipped during the walk |
//! | `extensions` | `BTreeSet<String>` | webp, jpg, jpeg, png | File extensions picked up by the walk |
//! | `dry_run` | `bool` | false | Never replace originals |
//!
//! ## Examples
//!
//! ```rust
//! use image_budget::config::CompressConfig;
//!
//! let config = CompressConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.ladder().levels(), vec![60, 55, 50, 45, 40]);
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::artifact::Budget;
use crate::config::ladder::QualityLadder;
use crate::error::{CompressError, CompressResult};

/// Directory names skipped by default: dependency caches and build output.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    ".next",
    "vendor",
];

/// Extensions picked up by the directory walk by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png"];

/// Configuration for a compression run.
#[derive(Debug, Clone)]
pub struct CompressConfig {
    /// Size budget in kilobytes. Must be greater than 0.
    pub max_size_kb: u64,

    /// First quality level tried for JPEG and WebP (0-100).
    pub quality: u8,

    /// Lowest quality the ladder may reach.
    pub min_quality: u8,

    /// Amount subtracted from the quality between attempts. Must be greater than 0.
    pub quality_step: u8,

    /// Maximum number of encode attempts per artifact. Must be greater than 0.
    pub max_iterations: usize,

    /// Root directory for the batch walk.
    pub root: PathBuf,

    /// Whether a still-oversized artifact should make the run exit non-zero.
    pub fail_on_oversized: bool,

    /// Optional longest-side limit applied before encoding. Never upscales.
    pub max_dimension: Option<u32>,

    /// Directory names skipped during the walk (matched on the final path component).
    pub excluded_dirs: BTreeSet<String>,

    /// Lowercase extensions (without the dot) picked up by the walk.
    pub extensions: BTreeSet<String>,

    /// Report what would be compressed without replacing anything.
    pub dry_run: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            max_size_kb: 500,
            quality: 60,
            min_quality: 20,
            quality_step: 5,
            max_iterations: 5,
            root: PathBuf::from("."),
            fail_on_oversized: true,
            max_dimension: None,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            dry_run: false,
        }
    }
}

impl CompressConfig {
    /// Creates a configuration with the four user-facing knobs and defaults for the rest.
    pub fn new(max_size_kb: u64, quality: u8, root: impl Into<PathBuf>, fail_on_oversized: bool) -> Self {
        Self {
            max_size_kb,
            quality,
            root: root.into(),
            fail_on_oversized,
            ..Self::default()
        }
    }

    /// Adds directory names to the exclusion set.
    pub fn with_excluded_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> CompressResult<()> {
        self.check_ranges()
            .map_err(|e| e.with_recovery_suggestion("adjust the flag or its IMAGE_* environment variable"))
    }

    fn check_ranges(&self) -> CompressResult<()> {
        if self.max_size_kb == 0 {
            return Err(CompressError::config("max_size_kb", "0", "must be greater than 0"));
        }
        if self.quality > 100 {
            return Err(CompressError::config(
                "quality",
                self.quality.to_string(),
                "must be between 0 and 100",
            ));
        }
        if self.min_quality > 100 {
            return Err(CompressError::config(
                "min_quality",
                self.min_quality.to_string(),
                "must be between 0 and 100",
            ));
        }
        if self.quality_step == 0 {
            return Err(CompressError::config("quality_step", "0", "must be greater than 0"));
        }
        if self.max_iterations == 0 {
            return Err(CompressError::config("max_iterations", "0", "must be greater than 0"));
        }
        if self.max_dimension == Some(0) {
            return Err(CompressError::config("max_dimension", "0", "must be greater than 0"));
        }
        Ok(())
    }

    /// The size budget as a typed value.
    pub fn budget(&self) -> Budget {
        Budget::from_kb(self.max_size_kb)
    }

    /// The quality ladder derived from `quality`, `quality_step`, `min_quality` and `max_iterations`.
    pub fn ladder(&self) -> QualityLadder {
        QualityLadder::new(self.quality, self.quality_step, self.min_quality, self.max_iterations)
    }

    /// Whether the walk should descend into a directory with this name.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    /// Whether the walk should pick up a file with this extension.
    pub fn is_recognized_extension(&self, ext: &str) -> bool {
        self.extensions.contains(&ext.to_ascii_lowercase())
    }
}
