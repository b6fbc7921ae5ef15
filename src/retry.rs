//! Retry with exponential backoff for embedding providers.
//!
//! The engine surfaces a provider failure exactly once. Callers who want
//! transient failures absorbed wrap their provider in [`RetryingProvider`]
//! before handing it to the engine.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::EmbeddingProvider;
use crate::types::Embedding;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further attempt.
    pub base_delay: Duration,
    /// Upper bound on a single delay (before jitter).
    pub max_delay: Duration,
    /// Add up to 50% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt + 1`.
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let exponential = base.saturating_mul(2_u64.saturating_pow(attempt));
        let delay = exponential.min(self.max_delay.as_millis() as u64);

        if self.jitter {
            let jitter = fastrand::u64(0..=delay / 2);
            Duration::from_millis(delay + jitter)
        } else {
            Duration::from_millis(delay)
        }
    }
}

/// Wraps a provider and retries both `Unavailable` and `Timeout` failures.
#[derive(Debug, Clone)]
pub struct RetryingProvider<P> {
    inner: P,
    config: RetryConfig,
}

impl<P> RetryingProvider<P> {
    pub fn new(inner: P, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for RetryingProvider<P> {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        let start = Instant::now();
        let mut attempt = 0;
        loop {
            match self.inner.embed(text).await {
                Ok(embedding) => {
                    if attempt > 0 {
                        debug!(
                            provider = self.inner.name(),
                            attempts = attempt + 1,
                            elapsed_micros = start.elapsed().as_micros(),
                            "embed_recovered"
                        );
                    }
                    return Ok(embedding);
                }
                Err(err) if attempt < self.config.max_retries => {
                    let delay = self.config.delay_for(attempt);
                    warn!(
                        provider = self.inner.name(),
                        attempt = attempt + 1,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "embed_retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        provider = self.inner.name(),
                        attempts = attempt + 1,
                        error = %err,
                        elapsed_micros = start.elapsed().as_micros(),
                        "embed_retries_exhausted"
                    );
                    return Err(err);
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for Flaky {
        async fn embed(&self, _text: &str) -> Result<Embedding, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if call % 2 == 0 {
                    Err(ProviderError::Unavailable("503".into()))
                } else {
                    Err(ProviderError::Timeout)
                }
            } else {
                Ok(Embedding::new(vec![1.0, 0.0]))
            }
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig::default()
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn retry_succeeds_eventually() {
        let provider = RetryingProvider::new(Flaky::new(2), fast().with_max_retries(3));
        let embedding = provider.embed("linen shirt").await.expect("recovers");
        assert_eq!(embedding.dimension(), 2);
        assert_eq!(provider.into_inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_fails_after_max_attempts() {
        let provider = RetryingProvider::new(Flaky::new(10), fast().with_max_retries(2));
        let err = provider.embed("linen shirt").await.expect_err("exhausted");
        // Third call (index 2) fails with Unavailable.
        assert_eq!(err, ProviderError::Unavailable("503".into()));
        assert_eq!(provider.into_inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let provider = RetryingProvider::new(Flaky::new(1), fast().with_max_retries(0));
        assert!(provider.embed("x").await.is_err());
        assert_eq!(provider.into_inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let cfg = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
            .with_jitter(false);
        assert_eq!(cfg.delay_for(0), Duration::from_millis(100));
        assert_eq!(cfg.delay_for(1), Duration::from_millis(200));
        assert_eq!(cfg.delay_for(2), Duration::from_millis(350));
        assert_eq!(cfg.delay_for(60), Duration::from_millis(350));
    }

    #[test]
    fn jitter_stays_within_half_the_delay() {
        let cfg = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(true);
        for _ in 0..100 {
            let delay = cfg.delay_for(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }
}
