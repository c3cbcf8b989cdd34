//! # Refresh Loop
//!
//! Background state machine driving the rounds:
//!
//! ```text
//! Idle -> FetchingDirectory -> Calculating -> Publishing -> Idle
//!   \__________________ shutdown __________________/ -> Stopped
//! ```
//!
//! A failed directory fetch returns to `Idle` with the previous snapshot
//! still published. A round interrupted by shutdown publishes nothing.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

use super::calculator::ReputationCalculator;
use super::pool::WorkerPool;
use super::scope::{shutdown_requested, RoundScope};
use super::store::SnapshotStore;
use crate::config::{EmptyRoundPolicy, MonitorConfig};
use crate::domain::{
    Address, CancelReason, GatewayError, RefreshPhase, ReputationError, RoundReport, Snapshot,
};
use crate::ports::{ChainGateway, DiagnosticsSink, MonitorEvent, ParticipantDirectory};

/// How a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RoundOutcome {
    /// The round's records replaced the snapshot.
    Published,
    /// Every participant failed; previous snapshot kept.
    Preserved,
    /// Directory fetch failed; previous snapshot kept.
    DirectoryUnavailable,
    /// Shutdown interrupted the round.
    Abandoned,
}

/// Refresh loop owned by the background task.
pub(crate) struct RefreshLoop<G> {
    gateway: Arc<G>,
    calculator: Arc<ReputationCalculator<G>>,
    pool: WorkerPool,
    config: MonitorConfig,
    store: Arc<SnapshotStore>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    phase: watch::Sender<RefreshPhase>,
    shutdown: watch::Receiver<bool>,
    round: u64,
}

impl<G> RefreshLoop<G>
where
    G: ChainGateway + ParticipantDirectory + 'static,
{
    pub(crate) fn new(
        gateway: Arc<G>,
        config: MonitorConfig,
        store: Arc<SnapshotStore>,
        diagnostics: Arc<dyn DiagnosticsSink>,
        phase: watch::Sender<RefreshPhase>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            calculator: Arc::new(ReputationCalculator::new(Arc::clone(&gateway))),
            pool: WorkerPool::new(config.concurrency_limit),
            gateway,
            config,
            store,
            diagnostics,
            phase,
            shutdown,
            round: 0,
        }
    }

    /// Run until shutdown. The next round starts one interval after the
    /// previous one ends, so rounds never overlap.
    pub(crate) async fn run(mut self) {
        let mut stopped = false;

        if self.config.refresh_on_start && !*self.shutdown.borrow() {
            stopped = self.run_round().await == RoundOutcome::Abandoned;
        }

        while !stopped {
            let mut shutdown = self.shutdown.clone();
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(self.config.refresh_interval) => {}
            }
            stopped = self.run_round().await == RoundOutcome::Abandoned;
        }

        self.phase.send_replace(RefreshPhase::Stopped);
        self.diagnostics
            .record(&MonitorEvent::LoopStopped { rounds: self.round });
    }

    /// Execute one complete round.
    pub(crate) async fn run_round(&mut self) -> RoundOutcome {
        self.round += 1;
        let round = self.round;
        let started = Instant::now();
        self.diagnostics.record(&MonitorEvent::RoundStarted { round });

        let scope = RoundScope::new(self.config.round_timeout, self.shutdown.clone());

        self.phase.send_replace(RefreshPhase::FetchingDirectory);
        let listed = match scope.run(self.gateway.list_participants(None)).await {
            Ok(Ok(listed)) => listed,
            Ok(Err(error)) => return self.directory_unavailable(round, error),
            Err(CancelReason::Deadline) => {
                return self.directory_unavailable(round, GatewayError::Timeout)
            }
            Err(CancelReason::Shutdown) => return self.abandon(round),
        };
        let participants = unique(listed);
        let total = participants.len();

        self.phase.send_replace(RefreshPhase::Calculating);
        let results = self
            .pool
            .run(Arc::clone(&self.calculator), participants, &scope)
            .await;

        if scope.is_shutdown() {
            return self.abandon(round);
        }

        let mut report = RoundReport {
            round,
            participants: total,
            ..Default::default()
        };
        let mut records = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(reputation) => {
                    if reputation.slashed {
                        report.slashed += 1;
                    }
                    records.push(reputation);
                }
                Err(error) => {
                    if error.is_cancelled() {
                        report.cancelled += 1;
                    } else {
                        report.failed += 1;
                    }
                    self.diagnostics
                        .record(&MonitorEvent::ParticipantFailed { round, error });
                }
            }
        }
        report.succeeded = records.len();
        report.elapsed = started.elapsed();

        self.phase.send_replace(RefreshPhase::Publishing);
        let outcome = if report.is_total_failure()
            && self.config.empty_round_policy == EmptyRoundPolicy::PreserveLastGood
        {
            self.diagnostics
                .record(&MonitorEvent::SnapshotPreserved { report });
            RoundOutcome::Preserved
        } else {
            self.store.publish(Snapshot::new(round, records));
            self.diagnostics
                .record(&MonitorEvent::SnapshotPublished { report });
            RoundOutcome::Published
        };

        self.phase.send_replace(RefreshPhase::Idle);
        outcome
    }

    fn directory_unavailable(&self, round: u64, cause: GatewayError) -> RoundOutcome {
        self.diagnostics.record(&MonitorEvent::DirectoryUnavailable {
            round,
            error: ReputationError::DirectoryUnavailable(cause),
        });
        self.phase.send_replace(RefreshPhase::Idle);
        RoundOutcome::DirectoryUnavailable
    }

    fn abandon(&self, round: u64) -> RoundOutcome {
        self.diagnostics
            .record(&MonitorEvent::RoundAbandoned { round });
        RoundOutcome::Abandoned
    }
}

/// Drop repeated addresses, keeping first occurrence order.
fn unique(listed: Vec<Address>) -> Vec<Address> {
    let mut seen = HashSet::with_capacity(listed.len());
    listed
        .into_iter()
        .filter(|addr| seen.insert(addr.clone()))
        .collect()
}
