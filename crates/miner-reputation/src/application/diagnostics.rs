//! Default diagnostics sink backed by `tracing`.

use tracing::{debug, info, warn};

use crate::ports::{DiagnosticsSink, MonitorEvent};

/// Writes monitor events as structured `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::RoundStarted { round } => {
                debug!(round, "reputation round started");
            }
            MonitorEvent::DirectoryUnavailable { round, error } => {
                warn!(
                    round,
                    error = %error,
                    "participant directory unavailable, keeping previous snapshot"
                );
            }
            MonitorEvent::ParticipantFailed { round, error } => {
                let participant = error.participant().map(ToString::to_string);
                debug!(
                    round,
                    participant = participant.as_deref().unwrap_or("-"),
                    kind = error.kind(),
                    error = %error,
                    "participant dropped from round"
                );
            }
            MonitorEvent::SnapshotPublished { report } => {
                info!(
                    round = report.round,
                    participants = report.participants,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    cancelled = report.cancelled,
                    slashed = report.slashed,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "reputation snapshot published"
                );
            }
            MonitorEvent::SnapshotPreserved { report } => {
                warn!(
                    round = report.round,
                    participants = report.participants,
                    failed = report.failed,
                    cancelled = report.cancelled,
                    "every participant failed, keeping previous snapshot"
                );
            }
            MonitorEvent::RoundAbandoned { round } => {
                info!(round, "round abandoned on shutdown");
            }
            MonitorEvent::LoopStopped { rounds } => {
                info!(rounds, "reputation refresh loop stopped");
            }
        }
    }
}
