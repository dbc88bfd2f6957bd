//! Error types for the trendex pipeline
//!
//! This module defines the domain errors raised by trends sources and by
//! index construction.

use thiserror::Error;

use crate::analytics::{FrameError, ResampleError};

/// Errors raised while querying a trends source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source throttled the request
    #[error("Rate limit exceeded")]
    RateLimit,

    /// The source answered with a server-side failure
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Query rejected before it was sent
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// No recorded response for this query
    #[error("No snapshot recorded for query: {0}")]
    NotRecorded(String),

    /// Response did not contain a requested term
    #[error("Response is missing term '{0}'")]
    MissingTerm(String),

    /// Malformed response
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Snapshot I/O failure
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failure
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    /// Whether retrying the same query may succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Timeout | Self::Io(_)
        ) || matches!(self, Self::ServerError(code) if *code == 429 || *code >= 500)
    }
}

/// Errors raised while assembling the index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Source failure
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Frame construction or alignment failure
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Resampling failure
    #[error("Resample error: {0}")]
    Resample(#[from] ResampleError),

    /// Empty keyword list
    #[error("Keyword list is empty")]
    NoKeywords,

    /// Start date after end date
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },

    /// The benchmark term has zeros or too many ones in a window
    #[error(
        "Benchmark '{term}' has too many 0 or small values between {start} and {end}; \
         choose a different first search term or enable benchmark selection"
    )]
    WeakBenchmark {
        term: String,
        start: String,
        end: String,
    },

    /// Benchmark selection has no anchor term for the language
    #[error("Benchmark selection supports English (en) and Spanish (es), got '{0}'")]
    UnsupportedLanguage(String),

    /// A window produced no usable rows
    #[error("No complete rows returned for {0}")]
    EmptyWindow(String),

    /// The two windows being stitched share no dates
    #[error("Time chunk {chunk} does not overlap the rows stitched so far")]
    NoOverlap { chunk: usize },
}
