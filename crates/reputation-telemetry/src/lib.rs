//! # Reputation Telemetry
//!
//! Logging, tracing and metrics for the miner reputation monitor.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` console output, pretty or JSON
//! - **Traces**: optional OpenTelemetry export over OTLP
//! - **Metrics**: Prometheus registry in text exposition format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reputation_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())
//!         .await
//!         .expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP endpoint, enables trace export |
//! | `OTEL_SERVICE_NAME` | `miner-reputation` | Service name in traces |
//! | `REP_LOG_LEVEL` | `info` | Log level filter |
//! | `REP_JSON_LOGS` | `false` | JSON formatted logs |
//! | `REP_NETWORK` | `mainnet` | Deployment environment attribute |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{encode_metrics, register_metrics};
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber or tracer could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    /// Metrics could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize metrics and the global tracing subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending traces.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    let tracing = init_tracing(&config).await?;
    Ok(TelemetryGuard { _tracing: tracing })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
