//! Round cancellation scope.
//!
//! Every gateway call of a round runs inside a [`RoundScope`]: it is
//! abandoned once the round deadline passes or shutdown is requested,
//! whichever comes first.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::CancelReason;

/// Deadline plus shutdown signal shared by all work of one round.
#[derive(Clone, Debug)]
pub struct RoundScope {
    deadline: Instant,
    shutdown: watch::Receiver<bool>,
}

impl RoundScope {
    /// Scope ending `timeout` from now, or on shutdown.
    pub fn new(timeout: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            shutdown,
        }
    }

    /// Whether shutdown has been requested (or the manager is gone).
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow() || self.shutdown.has_changed().is_err()
    }

    /// Resolves when the scope is cancelled. Shutdown wins ties.
    pub async fn cancelled(&self) -> CancelReason {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => CancelReason::Shutdown,
            _ = tokio::time::sleep_until(self.deadline) => CancelReason::Deadline,
        }
    }

    /// Drive `fut` until it completes or the scope is cancelled.
    ///
    /// On cancellation `fut` is dropped without being polled again.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, CancelReason>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            reason = self.cancelled() => Err(reason),
            output = fut => Ok(output),
        }
    }
}

/// Wait until the shutdown flag is raised. A dropped sender counts as shutdown.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_before_deadline() {
        let (_tx, rx) = watch::channel(false);
        let scope = RoundScope::new(Duration::from_secs(5), rx);

        let result = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                42
            })
            .await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancelled_by_deadline() {
        let (_tx, rx) = watch::channel(false);
        let scope = RoundScope::new(Duration::from_secs(5), rx);

        let result = scope.run(std::future::pending::<()>()).await;

        assert_eq!(result, Err(CancelReason::Deadline));
        assert!(!scope.is_shutdown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancelled_by_shutdown() {
        let (tx, rx) = watch::channel(false);
        let scope = RoundScope::new(Duration::from_secs(60), rx);

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            tx.send_replace(true);
            tx
        });

        let result = scope.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(CancelReason::Shutdown));
        assert!(scope.is_shutdown());
        drop(trigger.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_counts_as_shutdown() {
        let (tx, rx) = watch::channel(false);
        let scope = RoundScope::new(Duration::from_secs(60), rx);
        drop(tx);

        assert!(scope.is_shutdown());
        assert_eq!(scope.cancelled().await, CancelReason::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_elapsed_deadline() {
        let (tx, rx) = watch::channel(false);
        let scope = RoundScope::new(Duration::from_secs(1), rx);
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send_replace(true);

        assert_eq!(scope.cancelled().await, CancelReason::Shutdown);
    }
}
