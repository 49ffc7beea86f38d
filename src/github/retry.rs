//! Exponential backoff retry for GitHub API calls.
//!
//! Only transient errors are retried. Bootstrap runs with [`RetryPolicy::NoRetry`]
//! unless `bootstrap_retries` is configured, in which case every listing call
//! gets that many retries with 2s, 4s, 8s, ... delays capped at 30s.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::{GitHubApiError, GitHubErrorKind};

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retry attempts after the initial attempt.
    pub max_retries: u32,

    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(30),
        backoff_multiplier: 2.0,
    };

    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Default delays with a configured retry count.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::DEFAULT
        }
    }

    /// Delay before retry `attempt` (0-indexed):
    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether transient errors are retried at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    RetryTransient,

    #[default]
    NoRetry,
}

impl RetryPolicy {
    /// `NoRetry` for zero, `RetryTransient` otherwise.
    pub fn from_retries(retries: u32) -> Self {
        if retries == 0 {
            RetryPolicy::NoRetry
        } else {
            RetryPolicy::RetryTransient
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T> {
    Success(T),

    /// A transient error persisted through every attempt.
    ExhaustedRetries {
        last_error: GitHubApiError,
        /// Attempts made, including the initial one.
        attempts: u32,
    },

    PermanentError(GitHubApiError),
}

impl<T> RetryResult<T> {
    pub fn into_result(self) -> Result<T, GitHubApiError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::PermanentError(e) => Err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }
}

/// Runs `operation` until it succeeds, fails permanently, or the retries run out.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let max_attempts = match policy {
        RetryPolicy::NoRetry => 1,
        RetryPolicy::RetryTransient => config.max_retries + 1,
    };
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => e,
        };
        attempt += 1;

        match err.kind {
            GitHubErrorKind::Permanent => return RetryResult::PermanentError(err),
            GitHubErrorKind::Transient if attempt >= max_attempts => {
                return RetryResult::ExhaustedRetries {
                    last_error: err,
                    attempts: attempt,
                };
            }
            GitHubErrorKind::Transient => {
                let delay = config.delay_for_attempt(attempt - 1);
                warn!(attempt, ?delay, error = %err, "Transient GitHub error, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig::new(retries, Duration::from_millis(1), Duration::from_millis(10), 2.0)
    }

    #[test]
    fn default_delays_are_2_4_8() {
        let delays: Vec<_> = RetryConfig::DEFAULT.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
        assert_eq!(RetryConfig::DEFAULT.total_max_wait(), Duration::from_secs(14));
    }

    #[test]
    fn long_retry_sequences_are_capped() {
        let delays: Vec<_> = RetryConfig::with_retries(8).delays().collect();
        assert_eq!(delays[3], Duration::from_secs(16));
        for delay in &delays[4..] {
            assert_eq!(*delay, Duration::from_secs(30));
        }
    }

    #[test]
    fn policy_from_retry_count() {
        assert_eq!(RetryPolicy::from_retries(0), RetryPolicy::NoRetry);
        assert_eq!(RetryPolicy::from_retries(3), RetryPolicy::RetryTransient);
        assert_eq!(RetryPolicy::default(), RetryPolicy::NoRetry);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(fast(3), RetryPolicy::RetryTransient, move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(GitHubApiError::permanent_without_source("Not Found")) }
        })
        .await;

        assert!(matches!(result, RetryResult::PermanentError(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_error_succeeds_on_third_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(fast(3), RetryPolicy::RetryTransient, move || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(GitHubApiError::transient_without_source("502"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(result.is_success());
        assert_eq!(result.into_result().unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_error_exhausts_retries() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(fast(2), RetryPolicy::RetryTransient, move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(GitHubApiError::transient_without_source("always fails")) }
        })
        .await;

        match result {
            RetryResult::ExhaustedRetries { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_retry_policy_returns_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(fast(5), RetryPolicy::NoRetry, move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(GitHubApiError::transient_without_source("error")) }
        })
        .await;

        assert!(matches!(result, RetryResult::ExhaustedRetries { attempts: 1, .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    proptest! {
        #[test]
        fn delays_are_monotonic_and_capped(
            initial_ms in 1u64..1000,
            max_ms in 1000u64..60000,
            multiplier in 1.5f64..3.0,
            max_retries in 1u32..15,
        ) {
            let config = RetryConfig::new(
                max_retries,
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
                multiplier,
            );

            let delays: Vec<_> = config.delays().collect();
            for window in delays.windows(2) {
                prop_assert!(window[1] >= window[0]);
            }
            for delay in &delays {
                prop_assert!(*delay <= Duration::from_millis(max_ms));
            }
        }
    }
}
