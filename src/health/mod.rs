/*!
 * # Health Check Module
 *
 * - Basic health check (`/health`) - overall status plus per-table load status
 * - Liveness check (`/health/live`) - process is up
 * - Version (`/health/version`) - build information
 *
 * Overall status is `up` when every table loaded, `degraded` when only some
 * did and `down` (503) when none did.
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{datasets::TableStatus, AppState};

/// Basic health status
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
}

impl HealthStatus {
    pub fn from_tables(tables: &[TableStatus]) -> Self {
        let loaded = tables.iter().filter(|t| t.loaded).count();
        if loaded == 0 {
            HealthStatus::Down
        } else if loaded < tables.len() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        }
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            HealthStatus::Up | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Overall health information
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub data_dir: String,
    pub loaded_tables: usize,
    pub total_tables: usize,
    pub tables: Vec<TableStatus>,
}

pub fn uptime_seconds(started_at: SystemTime) -> u64 {
    SystemTime::now()
        .duration_since(started_at)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
    }))
}

/// Basic health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "At least one table is loaded", body = HealthInfo),
        (status = 503, description = "No table could be loaded", body = HealthInfo)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("Health check endpoint called");

    let tables = match state.dashboard.table_status().await {
        Ok(tables) => tables,
        Err(err) => {
            warn!(error = %err, "dataset snapshot unavailable for health check");
            Vec::new()
        }
    };
    let status = HealthStatus::from_tables(&tables);
    let health = HealthInfo {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: uptime_seconds(state.started_at),
        data_dir: state.dashboard.cache().data_dir().display().to_string(),
        loaded_tables: tables.iter().filter(|t| t.loaded).count(),
        total_tables: tables.len(),
        tables,
    };

    if status != HealthStatus::Up {
        warn!(status = ?status, loaded = health.loaded_tables, "dashboard health is not optimal");
    }

    (status.status_code(), Json(health))
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": uptime_seconds(state.started_at),
            "timestamp": Utc::now(),
        })),
    )
}

/// Creates router with health check endpoints
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
        .route("/version", get(version_info))
}
