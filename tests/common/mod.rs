#![allow(dead_code)]

use std::{fs, path::PathBuf};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use inventory_dashboard::{build_router, config::AppConfig, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const INVENTORY_HEALTH: &str = "\
ProductID,Region,InventoryStatus
P1,North,Safe
P2,North,Below Threshold
P3,South,Safe
P4,East,Safe
P5,South,Below Threshold
";

pub const REORDER_STATUS: &str = "\
ProductID,Status
P1,Reorder Now
P2,OK
P3,Reorder Now
";

pub const TURNOVER_BY_PRODUCT: &str = "\
ProductID,TurnoverRatio
P1,4.2
P2,1.1
P3,2.5
";

pub const TOP5_SKUS: &str = "\
ProductID,TotalSold
P9,500
P3,410
P1,380
P4,300
P2,250
";

pub const BOTTOM5_SKUS: &str = "\
ProductID,TotalSold
P7,3
P6,5
P8,9
P5,12
P2,20
";

pub const AGING_INVENTORY: &str = "\
ProductID,DaysHighStock
P1,5
P2,20
P3,15
P4,14
";

pub const CHRONIC_UNDERSTOCK: &str = "\
ProductID,DaysBelowForecast
P5,7
P2,12
P4,9
";

pub const TURNOVER_REGION_CATEGORY: &str = "\
Region,Category,TurnoverRatio
North,Toys,1.5
North,Grocery,3.2
South,Toys,2.0
";

pub const WEATHER_IMPACT: &str = "\
WeatherCondition,AvgUnitsSold
Sunny,120.5
Rainy,80.25
Snowy,40
";

pub const SEASONAL_SALES: &str = "\
Seasonality,Category,TotalSales
Winter,Toys,1000
Winter,Grocery,2500
Summer,Toys,1400
Summer,Grocery,2100
";

pub const SUPPLY_DEMAND_GAP: &str = "\
ProductID,AvgSupplyGap
P1,-5
P2,0
P3,3
P4,-1
";

/// Every table with a consistent fixture.
pub fn full_fixture() -> Vec<(&'static str, &'static str)> {
    vec![
        ("InventoryHealth.csv", INVENTORY_HEALTH),
        ("ReorderStatus.csv", REORDER_STATUS),
        ("TurnoverByProduct.csv", TURNOVER_BY_PRODUCT),
        ("Top5SKUs.csv", TOP5_SKUS),
        ("Bottom5SKUs.csv", BOTTOM5_SKUS),
        ("AgingInventory.csv", AGING_INVENTORY),
        ("ChronicUnderstock.csv", CHRONIC_UNDERSTOCK),
        ("TurnoverByRegionCategory.csv", TURNOVER_REGION_CATEGORY),
        ("WeatherImpact.csv", WEATHER_IMPACT),
        ("SeasonalCategorySales.csv", SEASONAL_SALES),
        ("SupplyDemandGap.csv", SUPPLY_DEMAND_GAP),
    ]
}

/// Writes the given files into a fresh temporary directory.
pub fn data_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("failed to write fixture");
    }
    dir
}

/// Full fixture with some files replaced or removed (`None` removes).
pub fn data_dir_with(overrides: &[(&str, Option<&str>)]) -> TempDir {
    let files: Vec<(&str, &str)> = full_fixture()
        .into_iter()
        .filter_map(|(name, content)| {
            match overrides.iter().find(|(file, _)| *file == name) {
                Some((_, replacement)) => replacement.map(|c| (name, c)),
                None => Some((name, content)),
            }
        })
        .collect();
    data_dir(&files)
}

/// Router over a data directory, as the server builds it.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    dir: TempDir,
}

impl TestApp {
    pub fn new(dir: TempDir) -> Self {
        let mut config = AppConfig::new(
            PathBuf::from(dir.path()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        config.cors_allow_any_origin = true;

        let state = AppState::from_config(config);
        Self {
            router: build_router(state.clone()),
            state,
            dir,
        }
    }

    pub fn with_full_fixture() -> Self {
        Self::new(data_dir(&full_fixture()))
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub async fn request(&self, method: Method, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// GET returning status and parsed JSON body.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.request(Method::GET, uri).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn post_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.request(Method::POST, uri).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
