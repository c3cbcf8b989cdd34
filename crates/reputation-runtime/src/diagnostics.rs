//! Diagnostics sink that logs through `tracing` and updates Prometheus.

use miner_reputation::{DiagnosticsSink, MonitorEvent, TracingDiagnostics};
use reputation_telemetry::metrics::{
    CALCULATION_FAILURES, PARTICIPANTS_LISTED, ROUNDS, ROUND_DURATION, SNAPSHOT_RECORDS,
    SNAPSHOT_SLASHED,
};

/// Tracing plus metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetricsDiagnostics {
    tracing: TracingDiagnostics,
}

impl MetricsDiagnostics {
    /// New sink. Metrics must be registered separately to be exported.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticsSink for MetricsDiagnostics {
    fn record(&self, event: &MonitorEvent) {
        self.tracing.record(event);

        match event {
            MonitorEvent::RoundStarted { .. } | MonitorEvent::LoopStopped { .. } => {}
            MonitorEvent::DirectoryUnavailable { .. } => {
                ROUNDS.with_label_values(&["directory_unavailable"]).inc();
            }
            MonitorEvent::ParticipantFailed { error, .. } => {
                CALCULATION_FAILURES
                    .with_label_values(&[error.kind()])
                    .inc();
            }
            MonitorEvent::SnapshotPublished { report } => {
                ROUNDS.with_label_values(&["published"]).inc();
                PARTICIPANTS_LISTED.set(report.participants as f64);
                SNAPSHOT_RECORDS.set(report.succeeded as f64);
                SNAPSHOT_SLASHED.set(report.slashed as f64);
                ROUND_DURATION.observe(report.elapsed.as_secs_f64());
            }
            MonitorEvent::SnapshotPreserved { report } => {
                ROUNDS.with_label_values(&["preserved"]).inc();
                PARTICIPANTS_LISTED.set(report.participants as f64);
                ROUND_DURATION.observe(report.elapsed.as_secs_f64());
            }
            MonitorEvent::RoundAbandoned { .. } => {
                ROUNDS.with_label_values(&["abandoned"]).inc();
            }
        }
    }
}
