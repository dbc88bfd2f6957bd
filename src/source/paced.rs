//! Pacing wrapper around a trends source
//!
//! The upstream service locks out clients that query too quickly. This
//! wrapper provides:
//! - Rate limiting with governor
//! - Optional random pauses between queries ("slowdown")
//! - Automatic retry with exponential backoff on recoverable errors

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::Rng;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::{validate_query, validate_response, TrendsSource};
use crate::models::{InterestOverTime, TrendQuery};
use crate::utils::error::SourceError;
use crate::utils::retry::{retry_query, RetryConfig};

/// Random pause inserted before every query after the first
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Whether to pause at all
    pub slowdown: bool,

    /// Shortest pause in milliseconds
    pub min_delay_ms: u64,

    /// Longest pause in milliseconds
    pub max_delay_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            slowdown: true,
            min_delay_ms: 2_000,
            max_delay_ms: 8_000,
        }
    }
}

impl Pacing {
    /// No pauses, for recorded sources and tests
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            slowdown: false,
            ..Self::default()
        }
    }

    /// Draw the next pause
    fn next_delay(&self) -> Option<Duration> {
        if !self.slowdown {
            return None;
        }
        let (lo, hi) = if self.min_delay_ms <= self.max_delay_ms {
            (self.min_delay_ms, self.max_delay_ms)
        } else {
            (self.max_delay_ms, self.min_delay_ms)
        };
        let ms = rand::thread_rng().gen_range(lo..=hi);
        Some(Duration::from_millis(ms))
    }
}

/// Source wrapper that paces, rate limits and retries queries
pub struct PacedSource<S> {
    /// Wrapped source
    inner: S,

    /// Rate limiter to control query frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Random pauses between queries
    pacing: Pacing,

    /// Backoff policy for recoverable errors
    retry: RetryConfig,

    /// Queries issued so far
    issued: AtomicU64,
}

impl<S: TrendsSource> PacedSource<S> {
    /// Wrap `inner` with a per-minute query quota
    pub fn new(inner: S, requests_per_minute: u32, pacing: Pacing, retry: RetryConfig) -> Self {
        let rate = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(rate));

        Self {
            inner,
            rate_limiter,
            pacing,
            retry,
            issued: AtomicU64::new(0),
        }
    }

    /// Number of queries passed to the inner source, retries excluded
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: TrendsSource> TrendsSource for PacedSource<S> {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        validate_query(query)?;

        let previous = self.issued.fetch_add(1, Ordering::Relaxed);
        if previous > 0 {
            if let Some(delay) = self.pacing.next_delay() {
                debug!(delay_ms = delay.as_millis() as u64, "Pausing before query");
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            terms = %query.keywords.join(", "),
            geo = %query.geo,
            timeframe = %query.timeframe,
            "Querying trends source"
        );

        // retries count against the quota too
        let label = query.canonical();
        let response = retry_query(&self.retry, &label, || async {
            self.rate_limiter.until_ready().await;
            self.inner.interest_over_time(query).await
        })
        .await?;

        validate_response(query, &response)?;
        Ok(response)
    }
}
