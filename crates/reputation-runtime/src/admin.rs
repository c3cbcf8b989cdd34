//! # Admin Endpoint
//!
//! Read-only HTTP view of the monitor:
//!
//! | Route | Body |
//! |-------|------|
//! | `/health` | lifecycle state, refresh phase, latest round |
//! | `/reputations` | latest snapshot as JSON |
//! | `/metrics` | Prometheus text format |

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use miner_reputation::ReputationApi;

type ApiState = Arc<dyn ReputationApi>;

/// Build the admin router.
pub fn build_admin_router(api: Arc<dyn ReputationApi>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reputations", get(reputations))
        .route("/metrics", get(metrics))
        .with_state(api)
}

/// Serve `router` on `addr` until `shutdown` is raised.
pub async fn serve_admin(
    addr: SocketAddr,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting admin server");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

async fn health(State(api): State<ApiState>) -> impl IntoResponse {
    let round = api.snapshot().map(|s| s.round);
    Json(json!({
        "state": api.state(),
        "phase": api.phase(),
        "round": round,
    }))
}

async fn reputations(State(api): State<ApiState>) -> impl IntoResponse {
    match api.snapshot() {
        Some(snapshot) => Json(json!(snapshot)),
        None => Json(json!({ "round": null, "records": [] })),
    }
}

async fn metrics() -> impl IntoResponse {
    match reputation_telemetry::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
