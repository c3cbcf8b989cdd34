//! Prometheus metrics for the reputation monitor.
//!
//! All metrics follow the naming convention: `rep_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: rounds by outcome, calculation failures by kind
//! - **Gauge**: participants listed, snapshot size, slashed participants
//! - **Histogram**: round duration

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Rounds by outcome (published, preserved, directory_unavailable, abandoned)
    pub static ref ROUNDS: CounterVec = CounterVec::new(
        Opts::new("rep_monitor_rounds_total", "Reputation rounds by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Per-participant calculation failures by error kind
    pub static ref CALCULATION_FAILURES: CounterVec = CounterVec::new(
        Opts::new(
            "rep_monitor_calculation_failures_total",
            "Participants dropped from a round, by error kind"
        ),
        &["kind"]
    ).expect("metric creation failed");

    /// Round duration histogram
    pub static ref ROUND_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "rep_monitor_round_duration_seconds",
            "Wall time from directory fetch to publication"
        ).buckets(exponential_buckets(0.01, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Participants returned by the last directory fetch
    pub static ref PARTICIPANTS_LISTED: Gauge = Gauge::new(
        "rep_directory_participants",
        "Participants listed by the last successful directory fetch"
    ).expect("metric creation failed");

    /// Records in the published snapshot
    pub static ref SNAPSHOT_RECORDS: Gauge = Gauge::new(
        "rep_snapshot_records",
        "Reputation records in the published snapshot"
    ).expect("metric creation failed");

    /// Slashed participants in the published snapshot
    pub static ref SNAPSHOT_SLASHED: Gauge = Gauge::new(
        "rep_snapshot_slashed",
        "Slashed participants in the published snapshot"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ROUNDS.clone()),
        Box::new(CALCULATION_FAILURES.clone()),
        Box::new(ROUND_DURATION.clone()),
        Box::new(PARTICIPANTS_LISTED.clone()),
        Box::new(SNAPSHOT_RECORDS.clone()),
        Box::new(SNAPSHOT_SLASHED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
