//! Trends data sources
//!
//! The search-trends service is an opaque collaborator: anything that can
//! answer an interest-over-time query for up to five terms implements
//! [`TrendsSource`]. Implementations here wrap a source with pacing and
//! retries, or serve responses recorded on disk.

pub mod paced;
pub mod snapshot;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{InterestOverTime, TrendQuery, MAX_QUERY_TERMS};
use crate::utils::error::SourceError;

pub use paced::{PacedSource, Pacing};
pub use snapshot::{CachedSource, SnapshotRecord, SnapshotSource, SnapshotStore};

/// Anything able to answer interest-over-time queries
#[async_trait]
pub trait TrendsSource: Send + Sync {
    /// Relative interest (0–100 within the query) for every term over the
    /// query's timeframe, one row per period
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError>;
}

#[async_trait]
impl<S: TrendsSource + ?Sized> TrendsSource for Arc<S> {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        (**self).interest_over_time(query).await
    }
}

#[async_trait]
impl<S: TrendsSource + ?Sized> TrendsSource for Box<S> {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        (**self).interest_over_time(query).await
    }
}

/// Reject queries the source would refuse
pub fn validate_query(query: &TrendQuery) -> Result<(), SourceError> {
    if query.keywords.is_empty() {
        return Err(SourceError::InvalidQuery("no search terms".to_string()));
    }
    if query.keywords.len() > MAX_QUERY_TERMS {
        return Err(SourceError::InvalidQuery(format!(
            "{} terms, at most {MAX_QUERY_TERMS} allowed",
            query.keywords.len()
        )));
    }
    if let Some(blank) = query.keywords.iter().find(|k| k.trim().is_empty()) {
        return Err(SourceError::InvalidQuery(format!("blank term '{blank}'")));
    }
    Ok(())
}

/// Check that a response covers every queried term
pub fn validate_response(query: &TrendQuery, response: &InterestOverTime) -> Result<(), SourceError> {
    if response.is_partial.len() != response.frame.len() {
        return Err(SourceError::Malformed(format!(
            "{} partial flags for {} rows",
            response.is_partial.len(),
            response.frame.len()
        )));
    }
    if let Some(missing) = query
        .keywords
        .iter()
        .find(|k| !response.frame.has_column(k))
    {
        return Err(SourceError::MissingTerm(missing.clone()));
    }
    Ok(())
}
