//! # Size-Bounded Re-encoder
//!
//! Decides whether an artifact meets its size budget and, if not, regenerates it
//! at lower fidelity:
//!
//! 1. Within budget: `Unchanged`, nothing is decoded or written.
//! 2. Unknown format: `Unsupported`, nothing is decoded or written.
//! 3. PNG: one lossless re-encode at maximum compression.
//! 4. JPEG/WebP: walk the [`QualityLadder`](crate::config::QualityLadder) from the
//!    highest level and keep the first candidate that fits (first-fit).
//!
//! Candidates are written to a [`NamedTempFile`] next to the original. The scratch
//! file is promoted with an atomic rename only when it fits the budget; on every
//! other path it is dropped, which removes it. Errors never touch the original and
//! surface as `Failed`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::DynamicImage;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::artifact::{Artifact, Budget, ImageFormat};
use crate::codec::{EncodeTarget, ImageCodec, StandardCodec, fit_to_max_dimension};
use crate::config::CompressConfig;
use crate::error::{CompressError, CompressResult, classify};
use crate::outcome::CompressionOutcome;

/// A candidate that has been fully written and measured but not yet promoted.
struct Candidate {
    scratch: NamedTempFile,
    size_bytes: u64,
}

/// Evaluates artifacts against a budget using a codec.
pub struct Reencoder<'a, C: ImageCodec = StandardCodec> {
    config: &'a CompressConfig,
    codec: C,
}

impl<'a> Reencoder<'a, StandardCodec> {
    pub fn new(config: &'a CompressConfig) -> Self {
        Self::with_codec(config, StandardCodec)
    }
}

impl<'a, C: ImageCodec> Reencoder<'a, C> {
    pub fn with_codec(config: &'a CompressConfig, codec: C) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &CompressConfig {
        self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Open the file at `path` and evaluate it against the configured budget.
    pub fn evaluate_path(&self, path: &Path) -> CompressionOutcome {
        match Artifact::open(path) {
            Ok(artifact) => self.evaluate(&artifact, self.config.budget()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open artifact");
                CompressionOutcome::Failed { reason: classify::describe(&e) }
            }
        }
    }

    /// Evaluate `artifact` against `budget`.
    ///
    /// The original file is modified only when the outcome is `Compressed`
    /// (and never in dry-run mode).
    pub fn evaluate(&self, artifact: &Artifact, budget: Budget) -> CompressionOutcome {
        let outcome = match self.try_evaluate(artifact, budget) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %artifact.path.display(), error = %e, "re-encode failed; original kept");
                CompressionOutcome::Failed { reason: classify::describe(&e) }
            }
        };
        info!(path = %artifact.path.display(), outcome = outcome.label(), "evaluated");
        outcome
    }

    fn try_evaluate(&self, artifact: &Artifact, budget: Budget) -> CompressResult<CompressionOutcome> {
        // Re-stat so the decision uses the bytes on disk now, not when the artifact was listed.
        let original_bytes = fs::metadata(&artifact.path)
            .map_err(|e| CompressError::io_at("stat artifact", &artifact.path, e))?
            .len();

        if budget.fits(original_bytes) {
            return Ok(CompressionOutcome::Unchanged { size_bytes: original_bytes });
        }

        match &artifact.format {
            ImageFormat::Other(_) => Ok(CompressionOutcome::Unsupported {
                format: artifact.format.clone(),
            }),
            ImageFormat::Png => {
                let image = self.load(artifact)?;
                let candidate = self.write_candidate(artifact, &image, EncodeTarget::PngMaxCompression)?;
                if budget.fits(candidate.size_bytes) && candidate.size_bytes < original_bytes {
                    self.promote(artifact, candidate, original_bytes, None)
                } else {
                    Ok(CompressionOutcome::StillOversized {
                        final_bytes: candidate.size_bytes,
                    })
                }
            }
            ImageFormat::Jpeg | ImageFormat::WebP => {
                let image = self.load(artifact)?;
                let mut last_size = original_bytes;
                for quality in &self.config.ladder() {
                    let target = match artifact.format {
                        ImageFormat::WebP => EncodeTarget::WebP { quality },
                        _ => EncodeTarget::Jpeg { quality },
                    };
                    let candidate = self.write_candidate(artifact, &image, target)?;
                    debug!(
                        path = %artifact.path.display(),
                        quality,
                        size_bytes = candidate.size_bytes,
                        budget_bytes = budget.bytes(),
                        "ladder attempt"
                    );
                    if budget.fits(candidate.size_bytes) {
                        return self.promote(artifact, candidate, original_bytes, Some(quality));
                    }
                    last_size = candidate.size_bytes;
                }
                Ok(CompressionOutcome::StillOversized { final_bytes: last_size })
            }
        }
    }

    fn load(&self, artifact: &Artifact) -> CompressResult<DynamicImage> {
        let image = self.codec.decode(&artifact.path)?;
        match self.config.max_dimension {
            Some(max) => fit_to_max_dimension(image, max),
            None => Ok(image),
        }
    }

    fn write_candidate(
        &self,
        artifact: &Artifact,
        image: &DynamicImage,
        target: EncodeTarget,
    ) -> CompressResult<Candidate> {
        let mut scratch = tempfile::Builder::new()
            .prefix(".image-budget-")
            .suffix(".tmp")
            .tempfile_in(artifact.parent_dir())
            .map_err(|e| {
                CompressError::io_at("create scratch file", artifact.parent_dir(), e)
                    .with_recovery_suggestion("make the image's directory writable")
            })?;
        let scratch_path = scratch.path().to_path_buf();

        {
            let mut writer = BufWriter::new(scratch.as_file_mut());
            self.codec
                .encode(image, target, &mut writer)
                .map_err(|e| e.with_context(artifact.path.display().to_string()))?;
            writer
                .flush()
                .map_err(|e| CompressError::io_at("flush scratch file", &scratch_path, e))?;
        }
        scratch
            .as_file()
            .sync_all()
            .map_err(|e| CompressError::io_at("sync scratch file", &scratch_path, e))?;

        let size_bytes = scratch
            .as_file()
            .metadata()
            .map_err(|e| CompressError::io_at("stat scratch file", &scratch_path, e))?
            .len();

        Ok(Candidate { scratch, size_bytes })
    }

    fn promote(
        &self,
        artifact: &Artifact,
        candidate: Candidate,
        original_bytes: u64,
        quality: Option<u8>,
    ) -> CompressResult<CompressionOutcome> {
        let outcome = CompressionOutcome::Compressed {
            original_bytes,
            final_bytes: candidate.size_bytes,
            quality,
        };
        if self.config.dry_run {
            debug!(path = %artifact.path.display(), "dry run; discarding candidate");
            return Ok(outcome);
        }

        // The scratch file is created 0600; carry the original's mode over before the rename.
        let permissions = fs::metadata(&artifact.path)
            .map_err(|e| CompressError::io_at("stat artifact", &artifact.path, e))?
            .permissions();
        fs::set_permissions(candidate.scratch.path(), permissions)
            .map_err(|e| CompressError::io_at("copy permissions", candidate.scratch.path(), e))?;

        candidate
            .scratch
            .persist(&artifact.path)
            .map_err(|e| {
                CompressError::replace(&artifact.path, e.error)
                    .with_recovery_suggestion("make sure the path is a regular file in a writable directory")
            })?;
        Ok(outcome)
    }
}
