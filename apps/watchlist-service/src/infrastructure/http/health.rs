//! Health Check and Metrics Endpoints
//!
//! - `GET /health` - JSON status, version, uptime and consumer counters
//! - `GET /healthz` - liveness check (simple OK)
//! - `GET /readyz` - readiness check (store reachable)
//! - `GET /metrics` - Prometheus metrics in text format

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::controller::AppState;
use crate::application::services::ConsumerStatsSnapshot;
use crate::infrastructure::metrics::get_metrics_handle;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Process uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Whether the watchlist store answered a ping.
    pub store_reachable: bool,
    /// Consumer counters, if a consumer runs in this process.
    pub consumer: Option<ConsumerStatsSnapshot>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store reachable.
    Healthy,
    /// Store unreachable; adds still enqueue but nothing is persisted.
    Unhealthy,
}

pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store_reachable = match state.watchlist.ready().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Store ping failed");
            false
        }
    };

    let status = if store_reachable {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        store_reachable,
        consumer: state.consumer_stats.as_ref().map(|stats| stats.snapshot()),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

pub(super) async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub(super) async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.watchlist.ready().await.is_ok() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

pub(super) async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}
