//! # Artifacts and Budgets
//!
//! An [`Artifact`] is an image file under evaluation: a fixed path plus the size
//! and format observed when it was opened. A [`Budget`] is the maximum size an
//! artifact may have after evaluation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompressError, CompressResult};

/// Bytes per kilobyte used for every budget comparison and report.
pub const BYTES_PER_KB: u64 = 1024;

/// Format tag derived from the file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    WebP,
    Jpeg,
    Png,
    /// Anything else; holds the lowercase extension (empty when there is none).
    Other(String),
}

impl ImageFormat {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "webp" => Self::WebP,
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the encoder for this format takes a quality parameter.
    pub fn has_quality_axis(&self) -> bool {
        matches!(self, Self::WebP | Self::Jpeg)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebP => write!(f, "webp"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::Other(ext) if ext.is_empty() => write!(f, "(no extension)"),
            Self::Other(ext) => write!(f, "{}", ext),
        }
    }
}

/// Maximum allowed artifact size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Budget {
    kb: u64,
}

impl Budget {
    pub fn from_kb(kb: u64) -> Self {
        Self { kb }
    }

    pub fn kb(&self) -> u64 {
        self.kb
    }

    pub fn bytes(&self) -> u64 {
        self.kb.saturating_mul(BYTES_PER_KB)
    }

    /// True when `size_bytes` is within the budget (inclusive).
    pub fn fits(&self, size_bytes: u64) -> bool {
        size_bytes <= self.bytes()
    }
}

/// An image file opened for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub format: ImageFormat,
}

impl Artifact {
    /// Stat the file at `path`. Fails when it is missing, unreadable or not a regular file.
    pub fn open(path: impl Into<PathBuf>) -> CompressResult<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path).map_err(|e| CompressError::io_at("stat artifact", &path, e))?;
        if !metadata.is_file() {
            return Err(CompressError::io_at(
                "stat artifact",
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let format = ImageFormat::from_path(&path);
        Ok(Self {
            path,
            size_bytes: metadata.len(),
            format,
        })
    }

    pub fn size_kb(&self) -> f64 {
        to_kb(self.size_bytes)
    }

    /// Directory that holds the artifact; scratch files are created here so the
    /// final rename stays on one filesystem.
    pub fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

/// Convert a byte count to kilobytes for display.
pub fn to_kb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_KB as f64
}
