use axum::{response::Json, routing::get, Router};
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory Dashboard API",
        version = "1.0.0",
        description = r#"
# Inventory Analytics Dashboard

Read-only views over precomputed inventory analytics tables (CSV files):
KPI cards, SKU performance, turnover, weather and seasonal sales, supply gap
distribution and the aging / understock tables.

Filtered charts return `{"state": "no_data", ...}` instead of an empty
series when the selected Region or Gap Type matches nothing.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Dashboard", description = "Dashboard view endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::dashboard::get_overview,
        crate::handlers::dashboard::get_kpis,
        crate::handlers::dashboard::get_status_distribution,
        crate::handlers::dashboard::get_regions,
        crate::handlers::dashboard::get_top_skus,
        crate::handlers::dashboard::get_bottom_skus,
        crate::handlers::dashboard::get_product_turnover,
        crate::handlers::dashboard::get_region_category_turnover,
        crate::handlers::dashboard::get_weather_impact,
        crate::handlers::dashboard::get_seasonal_sales,
        crate::handlers::dashboard::get_supply_gap,
        crate::handlers::dashboard::get_chronic_understock,
        crate::handlers::dashboard::get_aging_inventory,
        crate::handlers::dashboard::reload_datasets,
        crate::health::health_check,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::datasets::TableStatus,
            crate::datasets::TableId,
            crate::datasets::GapType,
            crate::health::HealthInfo,
            crate::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}
