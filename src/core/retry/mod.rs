//! Retry of throttled AWS calls
//!
//! Only rate-limit errors are retried. Anything else is returned to the
//! caller on the first failure.

pub mod backoff;

pub use backoff::BackoffPolicy;

use crate::config::RetryConfig;
use crate::domain::Result;
use std::future::Future;

/// Attempt ceiling plus the delay schedule between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl RetryPolicy {
    /// Create a policy making at most `max_attempts` calls
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy from the `[retry]` configuration section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, BackoffPolicy::from_config(config))
    }

    /// Run `call`, retrying throttling errors with backoff
    ///
    /// # Errors
    ///
    /// Returns the first non-throttling error, or the last throttling error
    /// once the attempt ceiling is reached.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_throttling() => {
                    let delay = self.backoff.delay(attempt);
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        tracing::error!(
                            operation = operation,
                            attempts = attempt,
                            error = %e,
                            "Retries exhausted"
                        );
                        return Err(e);
                    }

                    crate::log_retry_attempt!(operation, attempt, self.max_attempts, delay, e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, BackoffPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExporterError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn throttled() -> ExporterError {
        ExporterError::Throttled {
            operation: "DescribeExportTasks".to_string(),
            message: "Rate exceeded".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_throttling_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = policy
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(throttled())
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(10, BackoffPolicy::default());

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(throttled())
            })
            .await;

        assert!(result.unwrap_err().is_throttling());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_throttling_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ExporterError::TaskAlreadyActive("limit".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ExporterError::TaskAlreadyActive(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        policy
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(throttled())
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();

        // 1s + 2s of base delay, up to 10% jitter each
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(3));
        assert!(elapsed <= std::time::Duration::from_millis(3_300));
    }
}
