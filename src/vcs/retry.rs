//! Exponential backoff retry for pushes.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::clock::Sleeper;
use crate::error::VcsError;

use super::{RemoteTarget, VcsClient};

/// Configuration: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to `MAX_ATTEMPTS` times. Between failures the task
/// waits on `sleeper` for an exponentially increasing duration.
///
/// `wrap_exhausted` converts the last error into the caller's
/// `RetriesExhausted` variant.
pub async fn retry_with_backoff<T, E, Fut, F, S, W>(
    mut attempt: F,
    sleeper: &S,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    S: Sleeper + ?Sized,
    W: FnOnce(E) -> E,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if attempts >= MAX_ATTEMPTS => return Err(wrap_exhausted(e)),
            Err(e) => {
                warn!(attempt = attempts, error = %e, "Attempt failed, retrying");
                if let Some(wait_duration) = backoff.next_backoff() {
                    sleeper.sleep(wait_duration).await;
                }
            }
        }
    }
}

/// Push once, or with retries when `retry` is set.
pub async fn push_with_retry<V, S>(
    vcs: &V,
    target: &RemoteTarget,
    sleeper: &S,
    retry: bool,
) -> Result<(), VcsError>
where
    V: VcsClient + ?Sized,
    S: Sleeper + ?Sized,
{
    if !retry {
        return vcs.push(target).await;
    }

    retry_with_backoff(
        move || vcs.push(target),
        sleeper,
        |e| VcsError::RetriesExhausted(Box::new(e)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::MockVcsClient;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingSleeper {
        naps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.naps.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_push_without_retry_calls_once() {
        let mut mock = MockVcsClient::new();
        mock.expect_push()
            .times(1)
            .returning(|_| Err(VcsError::Push("offline".to_string())));
        let sleeper = RecordingSleeper::default();

        let result = push_with_retry(&mock, &RemoteTarget::default(), &sleeper, false).await;

        assert!(matches!(result, Err(VcsError::Push(_))));
        assert!(sleeper.naps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_retry_exhaustion() {
        let mut mock = MockVcsClient::new();
        mock.expect_push()
            .times(3)
            .returning(|_| Err(VcsError::Push("offline".to_string())));
        let sleeper = RecordingSleeper::default();

        let result = push_with_retry(&mock, &RemoteTarget::default(), &sleeper, true).await;

        match result {
            Err(VcsError::RetriesExhausted(inner)) => {
                assert!(matches!(*inner, VcsError::Push(_)));
            }
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        // Sleeps only between attempts.
        assert_eq!(sleeper.naps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_push_retry_succeeds_after_transient_failure() {
        let mut mock = MockVcsClient::new();
        let calls = std::sync::Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        mock.expect_push().times(2).returning(move |_| {
            if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(VcsError::Push("transient".to_string()))
            } else {
                Ok(())
            }
        });
        let sleeper = RecordingSleeper::default();

        let result = push_with_retry(&mock, &RemoteTarget::remote("upstream"), &sleeper, true).await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.naps.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_first_attempt_without_sleeping() {
        let sleeper = RecordingSleeper::default();
        let result: Result<&str, VcsError> = retry_with_backoff(
            || async { Ok("ok") },
            &sleeper,
            |e| VcsError::RetriesExhausted(Box::new(e)),
        )
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert!(sleeper.naps.lock().unwrap().is_empty());
    }
}
