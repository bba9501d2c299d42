//! # Error Handling
//!
//! Error types for the re-encoder, the batch driver and configuration loading.
//!
//! ## Architecture
//!
//! - **`CompressError`**: one variant per failing stage (config, I/O, decode, encode,
//!   downscale, replace, directory walk), each carrying an [`ErrorContext`]
//! - **Classification traits**: [`HasSeverity`] and [`HasRecoverySuggestion`];
//!   the re-encoder folds the suggestion into a `Failed` reason and the CLI
//!   prints it under the error line
//! - **`classify`**: helpers for the CLI to map an error onto an exit status
//!
//! Per-artifact failures are recoverable: the original file is untouched and the
//! batch continues. Only configuration and root-directory errors are fatal.
//!
//! ## Usage
//!
//! ```rust
//! use image_budget::error::{classify, CompressError, HasRecoverySuggestion};
//!
//! let error = CompressError::encode("jpeg", Some(55), "encoder rejected buffer")
//!     .with_context("re-encoding photos/cat.jpg")
//!     .with_recovery_suggestion("check that the file is a valid JPEG");
//!
//! assert!(!classify::is_fatal(&error));
//! assert_eq!(error.category(), "encode");
//! assert_eq!(error.recovery_suggestion(), Some("check that the file is a valid JPEG"));
//! ```

use std::{error::Error as StdError, fmt, path::Path};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Errors that fail a single artifact; the batch continues
    Error,
    /// Errors that abort the whole run
    Fatal,
}

/// Metadata about where an error occurred and what to do about it
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the given severity
    pub fn with_severity(severity: ErrorSeverity) -> Self {
        Self {
            severity,
            ..Self::default()
        }
    }
}

/// Base error type for the image-budget library
#[derive(Debug)]
pub enum CompressError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors while reading an artifact or writing scratch output
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// The codec could not decode the artifact
    Decode {
        path: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
    /// The codec failed while producing a candidate
    Encode {
        format: String,
        quality: Option<u8>,
        reason: String,
        context: ErrorContext,
    },
    /// Optional downscale pre-pass failed
    Scale {
        reason: String,
        context: ErrorContext,
    },
    /// Promoting the scratch file over the original failed
    Replace {
        path: String,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// The root directory is missing or unreadable
    Walk {
        root: String,
        reason: String,
        context: ErrorContext,
    },
}

impl CompressError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error tied to a file
    pub fn io_at(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.display().to_string()),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a decode error
    pub fn decode(path: &Path, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Decode {
            path: path.display().to_string(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Create an encode error
    pub fn encode(format: impl Into<String>, quality: Option<u8>, reason: impl Into<String>) -> Self {
        Self::Encode {
            format: format.into(),
            quality,
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a downscale error
    pub fn scale(reason: impl Into<String>) -> Self {
        Self::Scale {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a replace error
    pub fn replace(path: &Path, source: std::io::Error) -> Self {
        Self::Replace {
            path: path.display().to_string(),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a root-directory error
    pub fn walk(root: &Path, reason: impl Into<String>) -> Self {
        Self::Walk {
            root: root.display().to_string(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Scale { context, .. } => context,
            Self::Replace { context, .. } => context,
            Self::Walk { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Scale { context, .. } => context,
            Self::Replace { context, .. } => context,
            Self::Walk { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Scale { .. } => "scale",
            Self::Replace { .. } => "replace",
            Self::Walk { .. } => "walk",
        }
    }
}

impl fmt::Display for CompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config {
                field,
                value,
                reason,
                ..
            } => write!(f, "invalid {} '{}': {}", field, value, reason)?,
            Self::Io {
                operation,
                path: Some(path),
                source,
                ..
            } => write!(f, "{} failed for {}: {}", operation, path, source)?,
            Self::Io {
                operation, source, ..
            } => write!(f, "{} failed: {}", operation, source)?,
            Self::Decode { path, source, .. } => write!(f, "cannot decode {}: {}", path, source)?,
            Self::Encode {
                format,
                quality: Some(quality),
                reason,
                ..
            } => write!(f, "{} encode at quality {} failed: {}", format, quality, reason)?,
            Self::Encode { format, reason, .. } => write!(f, "{} encode failed: {}", format, reason)?,
            Self::Scale { reason, .. } => write!(f, "downscale failed: {}", reason)?,
            Self::Replace { path, source, .. } => {
                write!(f, "cannot replace {}: {}", path, source)?
            }
            Self::Walk { root, reason, .. } => write!(f, "cannot scan {}: {}", root, reason)?,
        }

        if let Some(context) = &self.context().context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl StdError for CompressError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Replace { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for CompressError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors with recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get the recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for CompressError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification helpers
pub mod classify {
    use super::*;

    /// Check if an error aborts the whole run
    pub fn is_fatal(error: &CompressError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }

    /// Process exit status when `error` ends the run: 2 for fatal errors, 1 otherwise
    pub fn exit_status(error: &CompressError) -> u8 {
        if is_fatal(error) { 2 } else { 1 }
    }

    /// The error message with its recovery suggestion appended, if any
    pub fn describe(error: &CompressError) -> String {
        match error.recovery_suggestion() {
            Some(hint) => format!("{}; {}", error, hint),
            None => error.to_string(),
        }
    }
}

impl From<std::io::Error> for CompressError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<budget_scale::cpu::ScaleError> for CompressError {
    fn from(error: budget_scale::cpu::ScaleError) -> Self {
        Self::scale(error.to_string())
    }
}

/// Result alias used throughout the crate
pub type CompressResult<T> = Result<T, CompressError>;
