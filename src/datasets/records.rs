//! Typed rows of the dashboard's input tables.
//!
//! Field names serialize back to the CSV column names so tables rendered by
//! the presentation layer keep the headers the analysts know.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// InventoryStatus value for SKUs under their stock threshold.
pub const BELOW_THRESHOLD: &str = "Below Threshold";
/// InventoryStatus value for SKUs with healthy stock.
pub const SAFE: &str = "Safe";
/// Reorder Status value for SKUs that need replenishment.
pub const REORDER_NOW: &str = "Reorder Now";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "InventoryStatus")]
    pub inventory_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReorderRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductTurnoverRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "TurnoverRatio")]
    pub turnover_ratio: f64,
}

/// Row of the top-5 and bottom-5 seller tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankedSkuRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "TotalSold")]
    pub total_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgingRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "DaysHighStock")]
    pub days_high_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UnderstockRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "DaysBelowForecast")]
    pub days_below_forecast: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionCategoryTurnover {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "TurnoverRatio")]
    pub turnover_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherImpactRecord {
    #[serde(rename = "WeatherCondition")]
    pub weather_condition: String,
    #[serde(rename = "AvgUnitsSold")]
    pub avg_units_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeasonalSalesRecord {
    #[serde(rename = "Seasonality")]
    pub seasonality: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "TotalSales")]
    pub total_sales: f64,
}

/// Supply gap row as read from disk, before the gap type is attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupplyGapRow {
    #[serde(rename = "ProductID", default)]
    pub product_id: Option<String>,
    #[serde(rename = "AvgSupplyGap")]
    pub avg_supply_gap: f64,
}

/// Supply gap row with its materialized [`GapType`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SupplyGapRecord {
    #[serde(rename = "ProductID", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(rename = "AvgSupplyGap")]
    pub avg_supply_gap: f64,
    #[serde(rename = "GapType")]
    pub gap_type: GapType,
}

/// Over- or under-supply relative to forecast demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum GapType {
    Overstock,
    Understock,
}

impl GapType {
    /// Negative gaps are overstock; zero and positive gaps are understock.
    pub fn from_supply_gap(avg_supply_gap: f64) -> Self {
        if avg_supply_gap < 0.0 {
            GapType::Overstock
        } else {
            GapType::Understock
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GapType::Overstock => "Overstock",
            GapType::Understock => "Understock",
        }
    }
}

impl fmt::Display for GapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GapType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Overstock" => Ok(GapType::Overstock),
            "Understock" => Ok(GapType::Understock),
            other => Err(format!(
                "unknown gap type '{}', expected All, Overstock or Understock",
                other
            )),
        }
    }
}
