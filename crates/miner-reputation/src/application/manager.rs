//! # Reputation Manager
//!
//! Owns the refresh loop task and the published snapshot. Construction
//! starts the loop; [`ReputationManager::close`] stops it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::diagnostics::TracingDiagnostics;
use super::refresh::RefreshLoop;
use super::store::SnapshotStore;
use crate::config::{ConfigError, MonitorConfig};
use crate::domain::{LifecycleState, RefreshPhase, Reputation, Snapshot};
use crate::ports::{ChainGateway, DiagnosticsSink, ParticipantDirectory, ReputationApi};

/// Handle to a running reputation monitor.
///
/// Reads are lock-light and never wait on a round in progress.
pub struct ReputationManager {
    config: MonitorConfig,
    store: Arc<SnapshotStore>,
    state: Mutex<LifecycleState>,
    phase: watch::Receiver<RefreshPhase>,
    shutdown: watch::Sender<bool>,
    task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl ReputationManager {
    /// Start a monitor with the default configuration, logging through
    /// `tracing`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new<G>(gateway: Arc<G>) -> Self
    where
        G: ChainGateway + ParticipantDirectory + 'static,
    {
        Self::spawn(
            gateway,
            MonitorConfig::default(),
            Arc::new(TracingDiagnostics),
        )
    }

    /// Start a monitor with an explicit configuration and diagnostics sink.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation; no task is
    /// started in that case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config<G>(
        gateway: Arc<G>,
        config: MonitorConfig,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, ConfigError>
    where
        G: ChainGateway + ParticipantDirectory + 'static,
    {
        config.validate()?;
        Ok(Self::spawn(gateway, config, diagnostics))
    }

    fn spawn<G>(
        gateway: Arc<G>,
        config: MonitorConfig,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self
    where
        G: ChainGateway + ParticipantDirectory + 'static,
    {
        let store = Arc::new(SnapshotStore::new());
        let (phase_tx, phase) = watch::channel(RefreshPhase::Idle);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let refresh = RefreshLoop::new(
            gateway,
            config.clone(),
            Arc::clone(&store),
            diagnostics,
            phase_tx,
            shutdown_rx,
        );
        let task = tokio::spawn(refresh.run());

        info!(
            interval_ms = config.refresh_interval.as_millis() as u64,
            timeout_ms = config.round_timeout.as_millis() as u64,
            concurrency = config.concurrency_limit,
            "reputation monitor started"
        );

        Self {
            config,
            store,
            state: Mutex::new(LifecycleState::Running),
            phase,
            shutdown,
            task: AsyncMutex::new(Some(task)),
        }
    }

    /// Owned copy of the latest published records.
    pub fn reputations(&self) -> Vec<Reputation> {
        self.store.reputations()
    }

    /// Owned copy of the latest snapshot, with round metadata.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.store.snapshot()
    }

    /// Receiver notified with the round number of every publish.
    pub fn watch_rounds(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Current refresh loop phase.
    pub fn phase(&self) -> RefreshPhase {
        *self.phase.borrow()
    }

    /// Lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Configuration the monitor runs with.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Stop the refresh loop and wait for it to exit.
    ///
    /// In-flight calculations are cancelled and the current round is not
    /// published. Safe to call any number of times, concurrently or not;
    /// every call returns only once the loop has exited.
    pub async fn close(&self) {
        let mut task = self.task.lock().await;
        let Some(handle) = task.take() else {
            return;
        };

        *self.state.lock() = LifecycleState::Stopping;
        self.shutdown.send_replace(true);

        if let Err(e) = handle.await {
            warn!(error = %e, "reputation refresh task ended abnormally");
        }

        *self.state.lock() = LifecycleState::Stopped;
        info!("reputation monitor closed");
    }
}

impl Drop for ReputationManager {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

#[async_trait]
impl ReputationApi for ReputationManager {
    fn reputations(&self) -> Vec<Reputation> {
        ReputationManager::reputations(self)
    }

    fn snapshot(&self) -> Option<Snapshot> {
        ReputationManager::snapshot(self)
    }

    fn state(&self) -> LifecycleState {
        ReputationManager::state(self)
    }

    fn phase(&self) -> RefreshPhase {
        ReputationManager::phase(self)
    }

    async fn close(&self) {
        ReputationManager::close(self).await
    }
}
