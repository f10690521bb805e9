//! Bounded polling for long-running external operations.

use std::future::Future;
use std::time::Duration;

/// How often and how many times to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on time spent waiting: one interval before every attempt.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    /// The fetch itself failed; polling stops.
    #[error(transparent)]
    Fetch(E),

    #[error("operation not done after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Call `fetch` until `done` accepts its value, for at most
/// `policy.max_attempts` calls. Every attempt, the first included, waits
/// `policy.interval` first, so an exhausted poll takes [`PollPolicy::ceiling`].
///
/// `fetch` receives the 1-based attempt number.
pub async fn poll_until<T, E, F, Fut, D>(policy: PollPolicy, mut fetch: F, done: D) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: Fn(&T) -> bool,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;
        let value = fetch(attempt).await.map_err(PollError::Fetch)?;
        if done(&value) {
            return Ok(value);
        }
    }
    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn test_returns_when_done() {
        let result: Result<u32, PollError<()>> =
            poll_until(fast(10), |attempt| async move { Ok(attempt) }, |n| *n == 3).await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<bool, PollError<()>> = poll_until(
            fast(4),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(false) }
            },
            |done| *done,
        )
        .await;
        assert!(matches!(result, Err(PollError::Exhausted { attempts: 4 })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fetch_error_stops_polling() {
        let result: Result<u32, PollError<&str>> = poll_until(
            fast(10),
            |attempt| async move {
                if attempt == 2 {
                    Err("connection reset")
                } else {
                    Ok(attempt)
                }
            },
            |_| false,
        )
        .await;
        assert!(matches!(result, Err(PollError::Fetch("connection reset"))));
    }

    #[test]
    fn test_ceiling() {
        let policy = PollPolicy::new(Duration::from_secs(10), 60);
        assert_eq!(policy.ceiling(), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_waits_before_first_attempt() {
        let policy = PollPolicy::new(Duration::from_millis(30), 3);
        let started = std::time::Instant::now();
        let result: Result<u32, PollError<()>> =
            poll_until(policy, |attempt| async move { Ok(attempt) }, |_| true).await;
        assert_eq!(result.unwrap(), 1);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_exhausted_poll_spans_every_interval() {
        let policy = PollPolicy::new(Duration::from_millis(10), 3);
        let started = std::time::Instant::now();
        let result: Result<bool, PollError<()>> =
            poll_until(policy, |_| async { Ok(false) }, |done| *done).await;
        assert!(matches!(result, Err(PollError::Exhausted { attempts: 3 })));
        assert!(started.elapsed() >= policy.ceiling());
    }
}
