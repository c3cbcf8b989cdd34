//! # Miner Reputation Daemon
//!
//! Monitors storage-miner reputation against a Lotus full node and prints
//! the latest snapshot until stopped.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use miner_reputation::{LotusGateway, ReputationApi, ReputationManager};
use reputation_runtime::{
    build_admin_router, run_display, serve_admin, shutdown_signal, MetricsDiagnostics,
    RuntimeConfig,
};
use reputation_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("failed to initialize telemetry")?;

    let config = RuntimeConfig::load().context("failed to load configuration")?;
    info!(
        endpoint = %config.lotus.endpoint,
        interval_ms = config.monitor.refresh_interval.as_millis() as u64,
        concurrency = config.monitor.concurrency_limit,
        "Starting miner reputation monitor"
    );

    let gateway =
        Arc::new(LotusGateway::new(config.lotus.clone()).context("failed to create Lotus client")?);
    let manager = Arc::new(
        ReputationManager::with_config(
            gateway,
            config.monitor.clone(),
            Arc::new(MetricsDiagnostics::new()),
        )
        .context("invalid monitor configuration")?,
    );
    let api: Arc<dyn ReputationApi> = manager.clone();

    let (stop_tx, stop_rx) = watch::channel(false);

    let display = config.display.enabled.then(|| {
        tokio::spawn(run_display(
            Arc::clone(&api),
            config.display.interval,
            stop_rx.clone(),
        ))
    });

    let admin = config.admin.enabled.then(|| {
        let router = build_admin_router(Arc::clone(&api));
        tokio::spawn(serve_admin(config.admin.addr, router, stop_rx.clone()))
    });

    info!("Monitor is running. Press Ctrl+C to stop.");
    shutdown_signal().await;

    manager.close().await;
    stop_tx.send_replace(true);

    if let Some(handle) = display {
        if let Err(e) = handle.await {
            warn!(error = %e, "display task failed");
        }
    }
    if let Some(handle) = admin {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "admin server failed"),
            Err(e) => warn!(error = %e, "admin task failed"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}
