//! # image-budget
//!
//! Keeps oversized images out of version control. Each image is checked against
//! a size budget; images over budget are re-encoded at decreasing quality until a
//! candidate fits, and the original is replaced only by a validated candidate.
//!
//! ## Architecture
//!
//! - `config`: Immutable run configuration and the quality ladder
//! - `artifact`: Image files, format tags and size budgets
//! - `codec`: Decode/encode seam and the default `image`/`webp` implementation
//! - `reencoder`: The size-bounded re-encode decision procedure
//! - `batch`: Directory walk and outcome aggregation
//! - `outcome`: Per-artifact results
//! - `error`: Error types and classification
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_budget::{BatchDriver, CompressConfig, Reencoder};
//!
//! let config = CompressConfig::new(500, 60, "assets", true);
//! config.validate()?;
//!
//! let driver = BatchDriver::new(Reencoder::new(&config));
//! let report = driver.run_root(|path, outcome| println!("{}: {}", path.display(), outcome))?;
//! println!("{} compressed, {} still oversized", report.compressed, report.oversized.len());
//! # Ok::<(), image_budget::CompressError>(())
//! ```

pub mod artifact;
pub mod batch;
pub mod codec;
pub mod config;
pub mod error;
pub mod outcome;
pub mod reencoder;

pub use artifact::{Artifact, Budget, ImageFormat};
pub use batch::{BatchDriver, BatchReport, discover};
pub use codec::{EncodeTarget, ImageCodec, StandardCodec};
pub use config::{CompressConfig, QualityLadder};
pub use error::{CompressError, CompressResult, HasRecoverySuggestion, HasSeverity};
pub use outcome::CompressionOutcome;
pub use reencoder::Reencoder;
