//! Inventory Dashboard Library
//!
//! Loads precomputed inventory analytics tables from CSV files and serves
//! chart-ready dashboard views over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod datasets;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod views;

use axum::{extract::State, http::HeaderValue, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::SystemTime};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::{config::AppConfig, datasets::DatasetCache, services::dashboard::DashboardService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dashboard: DashboardService,
    pub started_at: SystemTime,
}

impl AppState {
    pub fn new(config: AppConfig, cache: DatasetCache) -> Self {
        Self {
            config: Arc::new(config),
            dashboard: DashboardService::new(cache),
            started_at: SystemTime::now(),
        }
    }

    /// State reading from the configured data directory.
    pub fn from_config(config: AppConfig) -> Self {
        let cache = DatasetCache::new(config.data_dir.clone());
        Self::new(config, cache)
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "service": "inventory-dashboard",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
        "datasets_loaded": state.dashboard.cache().is_loaded().await,
    });

    Ok(Json(ApiResponse::success(status_data)))
}

/// CORS from configuration: explicit origins first, permissive when allowed,
/// otherwise no cross-origin access.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// Full application router with every layer applied.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    Router::<AppState>::new()
        .route("/", get(|| async { "inventory-dashboard up" }))
        .nest("/health", health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::openapi_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

/// Binds the configured listen address; `host` may be a name such as `localhost`.
pub async fn bind_listener(config: &AppConfig) -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await
}

#[cfg(test)]
mod listener_tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn binds_a_host_name() {
        let config = AppConfig::new(PathBuf::from("data"), "localhost".into(), 0, "test".into());
        let listener = bind_listener(&config).await.expect("localhost should resolve");
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
