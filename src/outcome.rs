//! Result of evaluating one artifact against a budget.

use std::fmt;

use crate::artifact::{ImageFormat, to_kb};

/// What happened to an artifact.
///
/// Every variant except `Compressed` guarantees the original bytes are still on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressionOutcome {
    /// Already within budget; nothing was encoded or written.
    Unchanged { size_bytes: u64 },
    /// Replaced by a re-encoded candidate that fits the budget.
    /// `quality` is `None` for PNG, which has no quality axis.
    Compressed {
        original_bytes: u64,
        final_bytes: u64,
        quality: Option<u8>,
    },
    /// Format the re-encoder cannot handle.
    Unsupported { format: ImageFormat },
    /// An I/O or codec error stopped the evaluation.
    Failed { reason: String },
    /// Every candidate exceeded the budget; `final_bytes` is the last attempt's size.
    StillOversized { final_bytes: u64 },
}

impl CompressionOutcome {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_still_oversized(&self) -> bool {
        matches!(self, Self::StillOversized { .. })
    }

    /// Short machine-friendly label used in logs and JSON reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged { .. } => "unchanged",
            Self::Compressed { .. } => "compressed",
            Self::Unsupported { .. } => "unsupported",
            Self::Failed { .. } => "failed",
            Self::StillOversized { .. } => "still_oversized",
        }
    }
}

impl fmt::Display for CompressionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged { size_bytes } => {
                write!(f, "within budget ({:.1} KB)", to_kb(*size_bytes))
            }
            Self::Compressed {
                original_bytes,
                final_bytes,
                quality: Some(quality),
            } => write!(
                f,
                "{:.1} KB -> {:.1} KB (quality {})",
                to_kb(*original_bytes),
                to_kb(*final_bytes),
                quality
            ),
            Self::Compressed {
                original_bytes,
                final_bytes,
                quality: None,
            } => write!(
                f,
                "{:.1} KB -> {:.1} KB (lossless)",
                to_kb(*original_bytes),
                to_kb(*final_bytes)
            ),
            Self::Unsupported { format } => write!(f, "unsupported format {}", format),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
            Self::StillOversized { final_bytes } => {
                write!(f, "still {:.1} KB after compression", to_kb(*final_bytes))
            }
        }
    }
}
