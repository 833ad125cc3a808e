//! Rate-limit backoff: sleep until the window resets, then re-issue once.
//!
//! Twitter reports the end of the current rate-limit window in the
//! `x-rate-limit-reset` header (epoch seconds). On a 429 the retrier
//! sleeps `max(0, reset - now) + 1` seconds and sends the identical
//! request a second time. A second 429 is returned to the caller.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;
use crate::response::Outcome;

/// Boxed future returned by [`Sleeper::sleep`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of delays for rate-limit and upload-processing waits.
///
/// Production code uses [`TokioSleeper`]; tests inject a recording
/// implementation so no test ever waits on a real clock.
pub trait Sleeper: Send + Sync + fmt::Debug {
    /// Sleep for the given duration.
    fn sleep(&self, duration: Duration) -> SleepFuture;
}

/// Sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Configuration for rate-limit retry.
#[derive(Debug, Clone, Default)]
pub struct RateLimitConfig {
    /// Longest wait the retrier accepts. When set, a reset further away
    /// than this is surfaced as `RateLimited` without sleeping. Unset by
    /// default: the retrier always sleeps until the window resets.
    pub max_wait: Option<Duration>,
}

impl RateLimitConfig {
    /// Cap the wait the retrier accepts.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Wraps one dispatch with a single rate-limited re-issue.
#[derive(Debug, Clone)]
pub struct RateLimitRetrier {
    config: RateLimitConfig,
}

impl RateLimitRetrier {
    /// Create a retrier from config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    /// Seconds to wait for a window that resets at `reset`, seen at `now`.
    ///
    /// A missing reset header counts as a window that has already reset.
    pub fn wait_duration(reset: Option<i64>, now: i64) -> Duration {
        let remaining = reset.map_or(0, |reset| reset.saturating_sub(now).max(0));
        Duration::from_secs(remaining as u64 + 1)
    }

    /// Run `attempt`, and if it reports `RateLimited`, sleep through
    /// `sleeper` and run it exactly once more.
    ///
    /// Whatever the second attempt returns is final.
    pub async fn run<F, Fut>(&self, sleeper: &dyn Sleeper, mut attempt: F) -> Result<Outcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Outcome>>,
    {
        let outcome = attempt().await?;
        let Outcome::RateLimited { reset } = outcome else {
            return Ok(outcome);
        };

        let wait = Self::wait_duration(reset, chrono::Utc::now().timestamp());
        if let Some(max_wait) = self.config.max_wait.filter(|max| wait > *max) {
            warn!(
                wait_secs = wait.as_secs(),
                max_wait_secs = max_wait.as_secs(),
                "Rate limit window resets too far in the future, not retrying"
            );
            return Ok(Outcome::RateLimited { reset });
        }

        warn!(
            wait_secs = wait.as_secs(),
            reset,
            "Client has been rate limited, sleeping until the window resets"
        );
        sleeper.sleep(wait).await;

        attempt().await
    }
}

impl Default for RateLimitRetrier {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::response::ResponseBody;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Sleeper that records requested durations and returns immediately.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct RecordingSleeper {
        pub(crate) calls: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        pub(crate) fn recorded(&self) -> Vec<Duration> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> SleepFuture {
            self.calls.lock().unwrap().push(duration);
            Box::pin(async {})
        }
    }

    fn ok() -> Outcome {
        Outcome::Success(ResponseBody::Json(serde_json::json!({"data": {"id": "1"}})))
    }

    #[test]
    fn test_wait_duration() {
        assert_eq!(
            RateLimitRetrier::wait_duration(Some(105), 100),
            Duration::from_secs(6)
        );
        // Reset already passed.
        assert_eq!(
            RateLimitRetrier::wait_duration(Some(90), 100),
            Duration::from_secs(1)
        );
        assert_eq!(
            RateLimitRetrier::wait_duration(None, 100),
            Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn test_non_rate_limited_outcome_is_terminal() {
        let sleeper = RecordingSleeper::default();
        let attempts = AtomicU32::new(0);

        let outcome = RateLimitRetrier::default()
            .run(&sleeper, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(Outcome::EmptySuccess) }
            })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::EmptySuccess);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_retries_once_after_sleeping() {
        let sleeper = RecordingSleeper::default();
        let attempts = AtomicU32::new(0);
        let reset = chrono::Utc::now().timestamp() + 5;

        let outcome = RateLimitRetrier::default()
            .run(&sleeper, || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(Outcome::RateLimited { reset: Some(reset) })
                    } else {
                        Ok(ok())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome, ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        let slept = sleeper.recorded();
        assert_eq!(slept.len(), 1);
        assert!(slept[0] >= Duration::from_secs(5) && slept[0] <= Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_second_rate_limit_is_surfaced() {
        let sleeper = RecordingSleeper::default();
        let attempts = AtomicU32::new(0);

        let outcome = RateLimitRetrier::default()
            .run(&sleeper, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(Outcome::RateLimited { reset: None }) }
            })
            .await
            .unwrap();

        assert!(outcome.is_rate_limited());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_long_wait_is_slept_through_by_default() {
        let sleeper = RecordingSleeper::default();
        let attempts = AtomicU32::new(0);
        let reset = chrono::Utc::now().timestamp() + 905;

        let outcome = RateLimitRetrier::default()
            .run(&sleeper, || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(Outcome::RateLimited { reset: Some(reset) })
                    } else {
                        Ok(ok())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome, ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let slept = sleeper.recorded();
        assert_eq!(slept.len(), 1);
        assert!(slept[0] >= Duration::from_secs(905) && slept[0] <= Duration::from_secs(906));
    }

    #[tokio::test]
    async fn test_wait_beyond_cap_is_not_retried() {
        let sleeper = RecordingSleeper::default();
        let attempts = AtomicU32::new(0);
        let reset = chrono::Utc::now().timestamp() + 3600;

        let retrier =
            RateLimitRetrier::new(RateLimitConfig::default().with_max_wait(Duration::from_secs(60)));
        let outcome = retrier
            .run(&sleeper, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move { Ok(Outcome::RateLimited { reset: Some(reset) }) }
            })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::RateLimited { reset: Some(reset) });
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let sleeper = RecordingSleeper::default();
        let attempts = AtomicU32::new(0);

        let result = RateLimitRetrier::default()
            .run(&sleeper, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(crate::Error::new(crate::ErrorKind::Timeout)) }
            })
            .await;

        assert!(matches!(result.unwrap_err().kind, crate::ErrorKind::Timeout));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
