//! Unified error handling for the trendex crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`TrendexErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use trendex::error::{Error, TrendexErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         eprintln!("Retrying: {err}");
//!     } else {
//!         eprintln!("Fatal error ({:?}): {err}", err.category());
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::analytics::{FrameError, ResampleError};
pub use crate::utils::error::{IndexError, SourceError};

/// Common trait for all trendex error types
pub trait TrendexErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Trends source errors (throttling, timeouts, missing snapshots)
    Source,
    /// Shape or content of the series
    Data,
    /// Configuration and validation errors
    Config,
    /// Storage and I/O errors
    Storage,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Source => "trends source error",
            Self::Data => "data error",
            Self::Config => "configuration error",
            Self::Storage => "storage error",
            Self::Other => "other error",
        }
    }
}

impl TrendexErrorTrait for SourceError {
    fn is_recoverable(&self) -> bool {
        SourceError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::InvalidQuery(_) => ErrorCategory::Config,
            _ => ErrorCategory::Source,
        }
    }
}

impl TrendexErrorTrait for IndexError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_recoverable(),
            _ => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Source(e) => TrendexErrorTrait::category(e),
            Self::NoKeywords | Self::InvalidDateRange { .. } | Self::UnsupportedLanguage(_) => {
                ErrorCategory::Config
            }
            Self::Frame(_)
            | Self::Resample(_)
            | Self::WeakBenchmark { .. }
            | Self::EmptyWindow(_)
            | Self::NoOverlap { .. } => ErrorCategory::Data,
        }
    }
}

/// Unified error type for the trendex crate
#[derive(Error, Debug)]
pub enum Error {
    /// Trends source errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Index construction errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TrendexErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_recoverable(),
            Self::Index(e) => TrendexErrorTrait::is_recoverable(e),
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Source(e) => TrendexErrorTrait::category(e),
            Self::Index(e) => e.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Data,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let source_err = Error::Source(SourceError::Timeout);
        assert_eq!(source_err.category(), ErrorCategory::Source);

        let data_err = Error::Index(IndexError::NoOverlap { chunk: 2 });
        assert_eq!(data_err.category(), ErrorCategory::Data);

        let cfg_err = Error::Index(IndexError::UnsupportedLanguage("fr".into()));
        assert_eq!(cfg_err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_is_recoverable() {
        let err = Error::Source(SourceError::RateLimit);
        assert!(err.is_recoverable());

        let err = Error::Index(IndexError::Source(SourceError::ServerError(502)));
        assert!(err.is_recoverable());

        let err = Error::Index(IndexError::NoKeywords);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let unified: Error = IndexError::NoKeywords.into();
        assert!(matches!(unified, Error::Index(_)));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("keywords must not be empty");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("Something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(ErrorCategory::Other.description(), "other error");
    }
}
