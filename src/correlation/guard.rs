//! Call guard applied to every cluster read
//!
//! Wraps each collaborator call with the run's cancellation signal, a per-call
//! timeout, and a bounded retry budget for transient failures.

use crate::error::{Error, Result};
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default per-call timeout
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay before the first retry
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Cancellation, timeout and retry policy shared by all calls of one run
#[derive(Debug, Clone)]
pub struct CallGuard {
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    cancel: CancellationToken,
}

impl CallGuard {
    pub fn new(timeout: Duration, max_retries: u32, cancel: CancellationToken) -> Self {
        Self {
            timeout,
            max_retries,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            cancel,
        }
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `op`, retrying transient failures within the budget
    ///
    /// Timeouts surface as `CollaboratorUnavailable` and are retried like any
    /// other transient failure. Cancellation wins over an in-flight call.
    pub async fn call<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timeout = self.timeout;
        let max_retries = self.max_retries;
        let mut attempt = 0u32;

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(MAX_BACKOFF)
            .with_max_elapsed_time(None)
            .build();

        let attempts = backoff::future::retry_notify(
            policy,
            || {
                attempt += 1;
                let retries_left = attempt <= max_retries;
                let fut = op();
                async move {
                    let err = match tokio::time::timeout(timeout, fut).await {
                        Ok(Ok(value)) => return Ok(value),
                        Ok(Err(err)) => err,
                        Err(_) => Error::unavailable(
                            operation,
                            format!("timed out after {:?}", timeout),
                        ),
                    };
                    if retries_left && err.is_retryable() {
                        Err(backoff::Error::transient(err))
                    } else {
                        Err(backoff::Error::permanent(err))
                    }
                }
            },
            |err: Error, wait: Duration| {
                warn!(operation, retry_in = ?wait, "Transient cluster error: {}", err);
            },
        );

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = attempts => result,
        }
    }
}

impl Default for CallGuard {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT, 0, CancellationToken::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn guard(timeout_ms: u64, retries: u32) -> CallGuard {
        CallGuard::new(
            Duration::from_millis(timeout_ms),
            retries,
            CancellationToken::new(),
        )
        .with_initial_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let value = guard(1000, 0).call("get_node", || async { Ok(7) }).await;
        assert_matches!(value, Ok(7));
    }

    #[tokio::test]
    async fn test_transient_retried_within_budget() {
        let calls = AtomicU32::new(0);
        let result = guard(1000, 2)
            .call("get_claim", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Error::unavailable("get_claim", "503"))
                    } else {
                        Ok("bound")
                    }
                }
            })
            .await;

        assert_matches!(result, Ok("bound"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = guard(1000, 1)
            .call("get_volume", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::unavailable("get_volume", "connection reset")) }
            })
            .await;

        assert_matches!(result, Err(Error::CollaboratorUnavailable { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_never_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = guard(1000, 5)
            .call("get_node", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::not_found("Node", "gone")) }
            })
            .await;

        assert_matches!(result, Err(Error::ResourceNotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let result: Result<()> = guard(10, 0)
            .call("get_node", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert_matches!(
            result,
            Err(Error::CollaboratorUnavailable { operation, .. }) if operation == "get_node"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let guard = CallGuard::new(Duration::from_secs(1), 0, cancel);
        assert!(guard.is_cancelled());

        let result = guard.call("list_pods", || async { Ok(1) }).await;
        assert_matches!(result, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_in_flight_call() {
        let cancel = CancellationToken::new();
        let guard = CallGuard::new(Duration::from_secs(30), 0, cancel.clone());

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let result: Result<()> = guard
            .call("get_volume", || async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;

        trigger.await.unwrap();
        assert_matches!(result, Err(Error::Cancelled));
    }
}
