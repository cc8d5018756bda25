use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.backoff * attempt as u32
    }
}

#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    Permanent(E),
    Exhausted { attempts: usize, last: E },
}

pub async fn retry_transient<F, Fut, T, E, P>(
    policy: RetryPolicy,
    is_transient: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !is_transient(&err) => return Err(RetryError::Permanent(err)),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    tracing::error!(attempt, error = %err, "giving up after transient failures");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }

                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(5))
    }

    fn is_busy(err: &String) -> bool {
        err.starts_with("busy")
    }

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_recovers_from_transient_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_transient(fast_policy(), is_busy, |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(format!("busy on attempt {attempt}"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = retry_transient(fast_policy(), is_busy, |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err("already booked".to_string()) }
        })
        .await;

        assert_eq!(result, Err(RetryError::Permanent("already booked".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = retry_transient(fast_policy(), is_busy, |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("busy on attempt {attempt}")) }
        })
        .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "busy on attempt 3".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
