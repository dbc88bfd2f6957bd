//! Backoff for throttled trends queries
//!
//! The source answers bursts of queries with rate-limit errors that clear
//! after a pause. Recoverable failures are retried with capped exponential
//! backoff; anything else is returned at once.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::SourceError;

/// Backoff policy for one query
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Pause before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Longest pause, in milliseconds
    pub max_delay_ms: u64,

    /// Growth of the pause between consecutive retries
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_delays(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            ..Self::default()
        }
    }

    /// Single attempt, no retries
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Pause before retry number `retry` (1-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let ms = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis((ms as u64).min(self.max_delay_ms))
    }
}

/// Run `query` until it succeeds, fails unrecoverably or runs out of retries
///
/// `label` names the query in log events. Running out of retries yields
/// [`SourceError::MaxRetriesExceeded`].
///
/// # Example
///
/// ```no_run
/// use trendex::error::SourceError;
/// use trendex::utils::retry::{retry_query, RetryConfig};
///
/// async fn query() -> Result<u32, SourceError> {
///     Err(SourceError::RateLimit)
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let result = retry_query(&RetryConfig::default(), "flu", query).await;
///     assert!(matches!(result, Err(SourceError::MaxRetriesExceeded)));
/// }
/// ```
pub async fn retry_query<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    query: F,
) -> Result<T, SourceError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut retry = 0;
    loop {
        match query().await {
            Ok(value) => {
                if retry > 0 {
                    debug!(query = label, retries = retry, "Query succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) if retry >= config.max_retries => {
                warn!(query = label, retries = retry, error = %e, "Giving up on query");
                return Err(SourceError::MaxRetriesExceeded);
            }
            Err(e) => {
                retry += 1;
                let delay = config.delay_for(retry);
                warn!(
                    query = label,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Query failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
