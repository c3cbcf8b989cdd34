//! # Reputation Runtime
//!
//! Wiring for the miner reputation daemon.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs, optional OTLP traces, metrics)
//! 2. Load configuration (TOML file, then environment)
//! 3. Connect the Lotus gateway and start the `ReputationManager`
//! 4. Start the console display and, if enabled, the admin endpoint
//! 5. Wait for Ctrl-C or SIGTERM, then close everything in order

#![warn(missing_docs)]

pub mod admin;
pub mod config;
pub mod diagnostics;
pub mod display;

pub use admin::{build_admin_router, serve_admin};
pub use config::{AdminConfig, ConfigError, DisplayConfig, RuntimeConfig};
pub use diagnostics::MetricsDiagnostics;
pub use display::{render, run_display};

use tracing::{info, warn};

/// Resolve on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received"),
        _ = terminate => info!("SIGTERM received"),
    }
}
