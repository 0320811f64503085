//! Bounded fixed-delay retry driver.
//!
//! Each attempt reports an explicit [`Attempt`]: either retry (with a
//! reason kept for the exhaustion report) or done with a final result.
//! A `Done(Err(_))` stops the loop immediately; it is never retried.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T, E> {
    /// Not finished; try again after the delay.
    Retry(String),
    /// Finished, successfully or not. Never retried.
    Done(Result<T, E>),
}

/// Fixed delay between attempts, capped attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

/// Successful result plus the attempt it arrived on (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Why the driver stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// An attempt returned `Done(Err(_))`.
    Failed { attempt: u32, error: E },
    /// Every attempt asked to retry.
    Exhausted { attempts: u32, last_reason: String },
}

/// Run `op` until it is done or `max_attempts` attempts have been made.
///
/// Attempts are strictly sequential. The delay is applied between attempts
/// only, so `n` attempts sleep `n - 1` times.
pub async fn retry_fixed<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut last_reason = String::new();

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Attempt::Done(Ok(value)) => {
                return Ok(Retried {
                    value,
                    attempts: attempt,
                })
            }
            Attempt::Done(Err(error)) => return Err(RetryError::Failed { attempt, error }),
            Attempt::Retry(reason) => {
                debug!(attempt, max_attempts = policy.max_attempts, %reason, "attempt not finished");
                last_reason = reason;
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(RetryError::Exhausted {
        attempts: policy.max_attempts,
        last_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_always_retry_makes_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<Retried<()>, RetryError<String>> =
            retry_fixed(RetryPolicy::new(Duration::from_secs(1), 4), move |_| {
                let c = counter.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Attempt::Retry("still going".to_string())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            result.unwrap_err(),
            RetryError::Exhausted {
                attempts: 4,
                last_reason: "still going".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_err_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<Retried<()>, RetryError<&str>> =
            retry_fixed(RetryPolicy::new(Duration::from_secs(10), 60), move |attempt| {
                let c = counter.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    if attempt == 2 {
                        Attempt::Done(Err("broken"))
                    } else {
                        Attempt::Retry("running".to_string())
                    }
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            result.unwrap_err(),
            RetryError::Failed {
                attempt: 2,
                error: "broken"
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_only_between_attempts() {
        let start = tokio::time::Instant::now();

        let result: Result<Retried<u32>, RetryError<()>> =
            retry_fixed(RetryPolicy::new(Duration::from_secs(5), 3), |attempt| async move {
                if attempt < 3 {
                    Attempt::Retry(format!("attempt {}", attempt))
                } else {
                    Attempt::Done(Ok(attempt * 10))
                }
            })
            .await;

        let retried = result.unwrap();
        assert_eq!(retried.value, 30);
        assert_eq!(retried.attempts, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let start = tokio::time::Instant::now();

        let result: Result<Retried<&str>, RetryError<()>> =
            retry_fixed(RetryPolicy::new(Duration::from_secs(5), 3), |_| async {
                Attempt::Done(Ok("ok"))
            })
            .await;

        assert_eq!(result.unwrap().attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
