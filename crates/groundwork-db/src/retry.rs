//! Bounded retry of statements that lose a write conflict.
//!
//! SurrealDB runs each query in its own optimistic transaction. When two
//! transactions write the same record or index key at once, one of them
//! fails with a retryable conflict instead of waiting.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::DbError;

pub(crate) const MAX_ATTEMPTS: u32 = 32;

/// Upper bound of the random back-off before the next attempt.
fn backoff_ceiling(attempt: u32) -> Duration {
    Duration::from_millis(1 << attempt.min(7))
}

/// Run `statement` until it succeeds, fails for a non-retryable reason,
/// or `MAX_ATTEMPTS` attempts have conflicted.
pub(crate) async fn with_retry<T, F, Fut>(operation: &'static str, mut statement: F) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match statement().await {
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let ceiling = backoff_ceiling(attempt).as_millis() as u64;
                let delay = Duration::from_millis(rand::random_range(0..=ceiling));
                debug!(operation, attempt, ?delay, "write conflict, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                warn!(operation, attempts = attempt, error = %e, "write conflict persisted");
                return Err(e);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn conflict() -> DbError {
        DbError::Conflict("Transaction conflict: Write conflict, retry the transaction".into())
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_ceiling(1), Duration::from_millis(2));
        assert_eq!(backoff_ceiling(40), Duration::from_millis(128));
    }

    #[tokio::test]
    async fn conflicts_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let value = with_retry("test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(conflict())
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), DbError> = with_retry("test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DbError::Query("syntax error".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), DbError> = with_retry("test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
