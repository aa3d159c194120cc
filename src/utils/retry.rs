use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff Retry Strategy
// ============================================================================
//
// Caller-side policy for operations that can fail transiently, such as a
// move rejected with a version conflict. The event store and the aggregate
// never retry on their own; whoever owns the request decides.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

/// Result of a retry operation
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// Operation succeeded
    Success(T),
    /// Operation failed after all retries
    Failed(E),
    /// Operation permanently failed (should not retry)
    PermanentFailure(E),
}

impl<T, E> RetryResult<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed(error) | RetryResult::PermanentFailure(error) => Err(error),
        }
    }
}

/// Check if an error is transient (should retry) or permanent (should not retry)
pub trait IsTransient {
    fn is_transient(&self) -> bool;

    /// Stream version reported by the failure, when it carries one
    fn observed_version(&self) -> Option<i64> {
        None
    }
}

/// What the operation knows about the attempt it is running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number
    pub number: u32,
    /// Version reported by the previous failure, if any
    pub observed_version: Option<i64>,
}

/// Retry with transient error checking
///
/// A failure that reports the current version (a version conflict) is retried
/// at once, and the operation sees that version through
/// [`Attempt::observed_version`]. Other transient failures back off
/// exponentially.
pub async fn retry_on_transient<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(Attempt) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    let mut attempt = Attempt {
        number: 1,
        observed_version: None,
    };
    let mut delay = config.initial_delay;

    loop {
        let error = match operation(attempt).await {
            Ok(result) => {
                if attempt.number > 1 {
                    tracing::info!(attempt = attempt.number, "Operation succeeded after retry");
                }
                return RetryResult::Success(result);
            }
            Err(error) => error,
        };

        if !error.is_transient() {
            tracing::debug!(error = %error, "Permanent failure detected, not retrying");
            return RetryResult::PermanentFailure(error);
        }

        if attempt.number >= config.max_attempts {
            tracing::error!(
                attempt = attempt.number,
                error = %error,
                "Operation failed after all retries"
            );
            return RetryResult::Failed(error);
        }

        let observed_version = error.observed_version();
        match observed_version {
            Some(version) => tracing::debug!(
                attempt = attempt.number,
                observed_version = version,
                "Conflict reported the current version, retrying against it"
            ),
            None => {
                tracing::warn!(
                    attempt = attempt.number,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "Transient failure, retrying after delay"
                );
                sleep(delay).await;
                delay = next_delay(delay, &config);
            }
        }

        attempt = Attempt {
            number: attempt.number + 1,
            observed_version,
        };
    }
}

fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let next = Duration::from_millis((delay.as_millis() as f64 * config.multiplier) as u64);
    next.min(config.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    enum TestError {
        Busy,
        Stale(i64),
        Broken,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Busy | TestError::Stale(_))
        }

        fn observed_version(&self) -> Option<i64> {
            match self {
                TestError::Stale(version) => Some(*version),
                _ => None,
            }
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(fast_config(3), |_attempt| {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Busy)
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success("success")));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let result = retry_on_transient(fast_config(2), |_attempt| async {
            Err::<(), _>(TestError::Busy)
        })
        .await;

        assert!(matches!(result, RetryResult::Failed(TestError::Busy)));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(fast_config(5), |_attempt| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(TestError::Broken) }
        })
        .await;

        assert!(matches!(result, RetryResult::PermanentFailure(TestError::Broken)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(result.into_result().is_err());
    }

    #[tokio::test]
    async fn test_conflict_retries_against_reported_version() {
        let mut seen = Vec::new();

        let result = retry_on_transient(fast_config(3), |attempt| {
            seen.push(attempt);
            async move {
                match attempt.observed_version {
                    Some(version) => Ok(version + 1),
                    None => Err(TestError::Stale(4)),
                }
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success(5)));
        assert_eq!(
            seen,
            vec![
                Attempt { number: 1, observed_version: None },
                Attempt { number: 2, observed_version: Some(4) },
            ]
        );
    }

    #[tokio::test]
    async fn test_backoff_failures_carry_no_version() {
        let mut seen = Vec::new();

        let result = retry_on_transient(fast_config(2), |attempt| {
            seen.push(attempt.observed_version);
            async { Err::<(), _>(TestError::Busy) }
        })
        .await;

        assert!(matches!(result, RetryResult::Failed(TestError::Busy)));
        assert_eq!(seen, vec![None, None]);
    }

    #[test]
    fn test_delay_grows_up_to_max() {
        let config = fast_config(5);
        assert_eq!(next_delay(Duration::from_millis(1), &config), Duration::from_millis(2));
        assert_eq!(next_delay(Duration::from_millis(8), &config), Duration::from_millis(10));
    }
}
