//! HTTP metrics server for Prometheus scraping.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::{
    extract::State, http::header, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tunnelguard_core::{GuardMetrics, HANDSHAKE_TIMEOUT};

use crate::exporter;

/// Heartbeat age after which `/health` reports the watchdog as stalled.
///
/// The longest regular delay is one second past the handshake timeout.
const STALL_THRESHOLD: Duration = Duration::from_secs(2 * HANDSHAKE_TIMEOUT.as_secs());

#[derive(Clone)]
struct MetricsServerState {
    metrics: Arc<GuardMetrics>,
}

/// Builds the `/metrics` and `/health` routes.
pub fn router(metrics: Arc<GuardMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(MetricsServerState { metrics })
}

/// Serves metrics on `addr` until `cancel` fires.
pub async fn serve(
    addr: SocketAddr,
    metrics: Arc<GuardMetrics>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting metrics server on http://{}/metrics", addr);

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

/// Handle /metrics endpoint - Prometheus text format
async fn metrics_handler(State(state): State<MetricsServerState>) -> impl IntoResponse {
    match exporter::render(&state.metrics.snapshot()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, exporter::content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

/// Handle /health endpoint - heartbeat freshness
async fn health_handler(State(state): State<MetricsServerState>) -> impl IntoResponse {
    let snapshot = state.metrics.snapshot();

    let Some(heartbeat) = snapshot.heartbeat else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "starting" })),
        );
    };

    let age = SystemTime::now()
        .duration_since(heartbeat)
        .unwrap_or(Duration::ZERO);
    let (code, status) = if age <= STALL_THRESHOLD {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "stalled")
    };

    (
        code,
        Json(json!({ "status": status, "heartbeat_age_seconds": age.as_secs() })),
    )
}
