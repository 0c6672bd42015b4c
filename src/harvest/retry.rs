//! Transport-level retry policy.
//!
//! Retries connection failures, timeouts and a configured set of HTTP status
//! codes with exponential backoff. API-level errors are never retried here.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::RetryConfig;

/// Retry policy applied around a single HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: f64,
    max_backoff: Duration,
    status_forcelist: Vec<u16>,
}

impl RetryPolicy {
    /// A policy that performs exactly one attempt.
    pub fn none() -> Self {
        Self::from(&RetryConfig::disabled())
    }

    /// Total attempts including the first one.
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Sleep before retry number `retry` (1-based): `factor * 2^(retry-1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(16) as i32;
        let millis = (self.backoff_factor * 1000.0 * 2f64.powi(exponent)).round();
        Duration::from_millis(millis as u64).min(self.max_backoff)
    }

    /// Whether a failure is transient under this policy.
    pub fn is_retryable(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Network(_) => true,
            FetchError::Status(code) => self.status_forcelist.contains(code),
            FetchError::MalformedResponse(_) | FetchError::Api { .. } => false,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if retry < self.max_retries && self.is_retryable(&error) => {
                    retry += 1;
                    let delay = self.backoff(retry);
                    log::debug!(
                        "{}: {} (attempt {}/{}, next in {:?})",
                        label,
                        error,
                        retry,
                        self.attempts(),
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor.max(0.0),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
            status_forcelist: config.status_forcelist.clone(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::from(&RetryConfig {
            max_retries,
            backoff_factor: 0.0,
            ..RetryConfig::default()
        })
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(300));
        assert_eq!(policy.backoff(2), Duration::from_millis(600));
        assert_eq!(policy.backoff(3), Duration::from_millis(1200));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::from(&RetryConfig {
            backoff_factor: 10.0,
            max_backoff_secs: 15,
            ..RetryConfig::default()
        });
        assert_eq!(policy.backoff(5), Duration::from_secs(15));
    }

    #[test]
    fn test_retryable_classification() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(&FetchError::Status(503)));
        assert!(policy.is_retryable(&FetchError::Network("timeout".into())));
        assert!(!policy.is_retryable(&FetchError::Status(404)));
        assert!(!policy.is_retryable(&FetchError::api("ERROR", "bad key")));
        assert!(!policy.is_retryable(&FetchError::malformed("eof")));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Cell::new(0);
        let result = fast_policy(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(FetchError::Status(502))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = fast_policy(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(FetchError::Status(500)) }
            })
            .await;

        assert_eq!(result, Err(FetchError::Status(500)));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = fast_policy(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(FetchError::Status(404)) }
            })
            .await;

        assert_eq!(result, Err(FetchError::Status(404)));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_none_policy_single_attempt() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::none();
        assert_eq!(policy.attempts(), 1);
        let _: Result<(), _> = policy
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(FetchError::Network("refused".into())) }
            })
            .await;
        assert_eq!(calls.get(), 1);
    }
}
