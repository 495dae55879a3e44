use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    datasets::TableStatus,
    errors::ServiceError,
    services::dashboard::{
        AgingTableView, BarChartView, DashboardOverview, GroupedBarChartView, HeatmapView,
        KpiSummary, RegionOptions, StatusDistributionView, SupplyGapView, UnderstockTableView,
    },
    views::{GapFilter, RegionFilter},
    ApiResponse, AppState,
};

/// Build the dashboard Router scoped under `/api/v1/dashboard`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_overview))
        .route("/kpis", get(get_kpis))
        .route("/status-distribution", get(get_status_distribution))
        .route("/regions", get(get_regions))
        .route("/performance/top", get(get_top_skus))
        .route("/performance/bottom", get(get_bottom_skus))
        .route("/turnover/products", get(get_product_turnover))
        .route("/turnover/region-category", get(get_region_category_turnover))
        .route("/weather", get(get_weather_impact))
        .route("/seasonal", get(get_seasonal_sales))
        .route("/supply-gap", get(get_supply_gap))
        .route("/tables/understock", get(get_chronic_understock))
        .route("/tables/aging", get(get_aging_inventory))
        .route("/reload", post(reload_datasets))
}

/// Region selector
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RegionQuery {
    /// Region name, or "All" (default)
    pub region: Option<String>,
}

/// Gap type selector
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct GapTypeQuery {
    /// "All" (default), "Overstock" or "Understock"
    pub gap_type: Option<String>,
}

/// Both selectors, for the overview
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OverviewQuery {
    /// Region name, or "All" (default)
    pub region: Option<String>,
    /// "All" (default), "Overstock" or "Understock"
    pub gap_type: Option<String>,
}

fn parse_region(raw: Option<&str>) -> Result<RegionFilter, ServiceError> {
    raw.map_or(Ok(RegionFilter::All), |value| {
        value.parse().map_err(ServiceError::BadRequest)
    })
}

fn parse_gap_type(raw: Option<&str>) -> Result<GapFilter, ServiceError> {
    raw.map_or(Ok(GapFilter::All), |value| {
        value.parse().map_err(ServiceError::BadRequest)
    })
}

/// Every dashboard view in one response; failed views carry their error inline
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Dashboard overview generated", body = ApiResponse<DashboardOverview>),
        (status = 400, description = "Invalid selector value", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_overview(
    State(state): State<AppState>,
    Query(params): Query<OverviewQuery>,
) -> Result<Json<ApiResponse<DashboardOverview>>, ServiceError> {
    let region = parse_region(params.region.as_deref())?;
    let gap = parse_gap_type(params.gap_type.as_deref())?;
    let overview = state.dashboard.get_overview(&region, gap).await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// KPI cards
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/kpis",
    responses(
        (status = 200, description = "KPI summary", body = ApiResponse<KpiSummary>),
        (status = 500, description = "A required table is unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_kpis(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<KpiSummary>>, ServiceError> {
    let kpis = state.dashboard.get_kpis().await?;
    Ok(Json(ApiResponse::success(kpis)))
}

/// Inventory status breakdown, optionally for one region
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/status-distribution",
    params(RegionQuery),
    responses(
        (status = 200, description = "Status distribution", body = ApiResponse<StatusDistributionView>),
        (status = 400, description = "Empty region", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_status_distribution(
    State(state): State<AppState>,
    Query(params): Query<RegionQuery>,
) -> Result<Json<ApiResponse<StatusDistributionView>>, ServiceError> {
    let region = parse_region(params.region.as_deref())?;
    let view = state.dashboard.get_status_distribution(&region).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Region selector options
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/regions",
    responses(
        (status = 200, description = "Region options", body = ApiResponse<RegionOptions>)
    ),
    tag = "Dashboard"
)]
pub async fn get_regions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RegionOptions>>, ServiceError> {
    let regions = state.dashboard.get_regions().await?;
    Ok(Json(ApiResponse::success(regions)))
}

/// Top 5 SKUs by units sold
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/performance/top",
    responses(
        (status = 200, description = "Top SKUs", body = ApiResponse<BarChartView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_top_skus(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BarChartView>>, ServiceError> {
    let chart = state.dashboard.get_top_skus().await?;
    Ok(Json(ApiResponse::success(chart)))
}

/// Bottom 5 SKUs by units sold
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/performance/bottom",
    responses(
        (status = 200, description = "Bottom SKUs", body = ApiResponse<BarChartView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_bottom_skus(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BarChartView>>, ServiceError> {
    let chart = state.dashboard.get_bottom_skus().await?;
    Ok(Json(ApiResponse::success(chart)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/turnover/products",
    responses(
        (status = 200, description = "Turnover ratio per product", body = ApiResponse<BarChartView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_product_turnover(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BarChartView>>, ServiceError> {
    let chart = state.dashboard.get_product_turnover().await?;
    Ok(Json(ApiResponse::success(chart)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/turnover/region-category",
    responses(
        (status = 200, description = "Region by category turnover matrix", body = ApiResponse<HeatmapView>),
        (status = 500, description = "Duplicate region/category pair", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_region_category_turnover(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HeatmapView>>, ServiceError> {
    let heatmap = state.dashboard.get_region_category_turnover().await?;
    Ok(Json(ApiResponse::success(heatmap)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/weather",
    responses(
        (status = 200, description = "Average units sold per weather condition", body = ApiResponse<BarChartView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_weather_impact(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BarChartView>>, ServiceError> {
    let chart = state.dashboard.get_weather_impact().await?;
    Ok(Json(ApiResponse::success(chart)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/seasonal",
    responses(
        (status = 200, description = "Seasonal sales per category", body = ApiResponse<GroupedBarChartView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_seasonal_sales(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GroupedBarChartView>>, ServiceError> {
    let chart = state.dashboard.get_seasonal_sales().await?;
    Ok(Json(ApiResponse::success(chart)))
}

/// Supply gap distribution, optionally for one gap type
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/supply-gap",
    params(GapTypeQuery),
    responses(
        (status = 200, description = "Supply gap distribution", body = ApiResponse<SupplyGapView>),
        (status = 400, description = "Unknown gap type", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_supply_gap(
    State(state): State<AppState>,
    Query(params): Query<GapTypeQuery>,
) -> Result<Json<ApiResponse<SupplyGapView>>, ServiceError> {
    let gap = parse_gap_type(params.gap_type.as_deref())?;
    let view = state.dashboard.get_supply_gap(gap).await?;
    Ok(Json(ApiResponse::success(view)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/tables/understock",
    responses(
        (status = 200, description = "Chronic understock table", body = ApiResponse<UnderstockTableView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_chronic_understock(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UnderstockTableView>>, ServiceError> {
    let table = state.dashboard.get_chronic_understock().await?;
    Ok(Json(ApiResponse::success(table)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/tables/aging",
    responses(
        (status = 200, description = "Aging inventory table", body = ApiResponse<AgingTableView>)
    ),
    tag = "Dashboard"
)]
pub async fn get_aging_inventory(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AgingTableView>>, ServiceError> {
    let table = state.dashboard.get_aging_inventory().await?;
    Ok(Json(ApiResponse::success(table)))
}

/// Re-read every CSV file and swap the cached snapshot
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/reload",
    responses(
        (status = 200, description = "Per-table load status after reload", body = ApiResponse<Vec<TableStatus>>)
    ),
    tag = "Dashboard"
)]
pub async fn reload_datasets(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TableStatus>>>, ServiceError> {
    let status = state.dashboard.reload().await?;
    info!(
        loaded = status.iter().filter(|s| s.loaded).count(),
        total = status.len(),
        "datasets reloaded on request"
    );
    Ok(Json(ApiResponse::success(status)))
}
