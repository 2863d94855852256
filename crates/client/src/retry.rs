//! Bounded retry with exponential backoff.
//!
//! Only idempotent operations go through [`RetryPolicy::run`]; `store`
//! and delete-by-attributes call the remote exactly once so a transient
//! failure can never silently duplicate or over-delete.

use std::future::Future;
use std::time::Duration;

use cachewarden_core::config::HttpConfig;
use cachewarden_core::Result;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Run an idempotent operation, retrying transient failures
    /// (transport errors and 5xx responses) with exponential backoff.
    /// 4xx responses and usage errors fail immediately.
    pub async fn run<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient cache error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(http: &HttpConfig) -> Self {
        Self {
            max_retries: http.max_retries,
            base_delay: Duration::from_millis(http.retry_base_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachewarden_core::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let attempts = AtomicU32::new(0);
        let result = fast_policy(3)
            .run(|| async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::transport("connection reset"))
                } else {
                    Ok(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = fast_policy(3)
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::remote(401, "bad auth"))
            })
            .await;
        assert!(matches!(result, Err(Error::Remote { status: 401, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = fast_policy(2)
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::remote(503, "unavailable"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn none_policy_runs_exactly_once() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::none()
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::transport("timeout"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
