//! Retry decorator for market data providers.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::Quote;
use crate::provider::MarketDataProvider;

/// Exponential backoff settings for [`RetryingProvider`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for every further attempt.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Wraps a provider and retries calls that fail with a
/// [`RetryClass::WithBackoff`] error. Every other error is returned as-is.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: MarketDataProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(
        &self,
        operation: &str,
        symbol: &str,
        mut call: F,
    ) -> Result<T, MarketDataError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, MarketDataError>> + Send,
        T: Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.retry_class() == RetryClass::WithBackoff && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "{} {} for '{}' failed on attempt {}/{}: {}. Retrying in {:?}",
                        self.inner.id(),
                        operation,
                        symbol,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(
                        "{} {} for '{}' failed permanently after {} attempt(s): {}",
                        self.inner.id(),
                        operation,
                        symbol,
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for RetryingProvider<P> {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.run("latest quote", symbol, || self.inner.get_latest_quote(symbol))
            .await
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError> {
        self.run("history", symbol, || {
            self.inner.get_historical_quotes(symbol, start, end)
        })
        .await
    }
}
