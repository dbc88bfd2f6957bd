//! Recorded query responses
//!
//! Responses are stored as one JSON document per query, named after the
//! SHA256 fingerprint of the query. A store can be replayed on its own
//! ([`SnapshotSource`]) or sit in front of another source as a read-through
//! cache ([`CachedSource`]) so re-running an index never repeats a query.
//!
//! # Example
//!
//! ```no_run
//! use trendex::source::{SnapshotSource, SnapshotStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = SnapshotStore::open("./snapshots").await?;
//! let source = SnapshotSource::new(store);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{validate_query, validate_response, TrendsSource};
use crate::models::{InterestOverTime, TrendQuery};
use crate::utils::error::SourceError;

/// One recorded response, as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Query the response answers
    pub query: TrendQuery,

    /// When the response was recorded
    pub recorded_at: DateTime<Utc>,

    /// The response itself
    pub response: InterestOverTime,
}

/// Directory of recorded responses keyed by query fingerprint
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) a snapshot directory
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the response for `query`
    #[must_use]
    pub fn path_for(&self, query: &TrendQuery) -> PathBuf {
        self.dir.join(format!("{}.json", query.fingerprint()))
    }

    /// Load the recorded response for `query`, if any
    pub async fn load(&self, query: &TrendQuery) -> Result<Option<InterestOverTime>, SourceError> {
        let path = self.path_for(query);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: SnapshotRecord = serde_json::from_slice(&bytes)?;
        if record.query != *query {
            warn!(
                path = %path.display(),
                recorded = %record.query.canonical(),
                requested = %query.canonical(),
                "Snapshot belongs to a different query, ignoring"
            );
            return Ok(None);
        }

        debug!(path = %path.display(), "Snapshot loaded");
        Ok(Some(record.response))
    }

    /// Record `response` for `query`, replacing any previous recording
    pub async fn save(
        &self,
        query: &TrendQuery,
        response: &InterestOverTime,
    ) -> Result<PathBuf, SourceError> {
        let record = SnapshotRecord {
            query: query.clone(),
            recorded_at: Utc::now(),
            response: response.clone(),
        };
        let path = self.path_for(query);

        // Write to temp file first, then rename (atomic)
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!(path = %path.display(), "Snapshot saved");
        Ok(path)
    }

    /// Number of recorded responses
    pub async fn len(&self) -> Result<usize, SourceError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    pub async fn is_empty(&self) -> Result<bool, SourceError> {
        Ok(self.len().await? == 0)
    }
}

/// Source replaying recorded responses only
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    store: SnapshotStore,
}

impl SnapshotSource {
    #[must_use]
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TrendsSource for SnapshotSource {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        validate_query(query)?;
        let response = self
            .store
            .load(query)
            .await?
            .ok_or_else(|| SourceError::NotRecorded(query.canonical()))?;
        validate_response(query, &response)?;
        Ok(response)
    }
}

/// Read-through cache in front of another source
pub struct CachedSource<S> {
    inner: S,
    store: SnapshotStore,
}

impl<S: TrendsSource> CachedSource<S> {
    pub fn new(inner: S, store: SnapshotStore) -> Self {
        Self { inner, store }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: TrendsSource> TrendsSource for CachedSource<S> {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        if let Some(cached) = self.store.load(query).await? {
            debug!(query = %query.canonical(), "Serving query from snapshot");
            return Ok(cached);
        }
        let response = self.inner.interest_over_time(query).await?;
        self.store.save(query, &response).await?;
        Ok(response)
    }
}
