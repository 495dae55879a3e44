//! Explicit column schemas for the dashboard's input tables.
//!
//! Every table declares the columns it needs and the columns it can live
//! without. Headers are checked against the schema before any row is parsed,
//! so a missing column surfaces once, at load time, with the table and column
//! named.

use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::DatasetError;

/// Column names as they appear in the CSV headers.
pub mod columns {
    pub const PRODUCT_ID: &str = "ProductID";
    pub const REGION: &str = "Region";
    pub const INVENTORY_STATUS: &str = "InventoryStatus";
    pub const STATUS: &str = "Status";
    pub const TURNOVER_RATIO: &str = "TurnoverRatio";
    pub const TOTAL_SOLD: &str = "TotalSold";
    pub const DAYS_HIGH_STOCK: &str = "DaysHighStock";
    pub const DAYS_BELOW_FORECAST: &str = "DaysBelowForecast";
    pub const CATEGORY: &str = "Category";
    pub const WEATHER_CONDITION: &str = "WeatherCondition";
    pub const AVG_UNITS_SOLD: &str = "AvgUnitsSold";
    pub const SEASONALITY: &str = "Seasonality";
    pub const TOTAL_SALES: &str = "TotalSales";
    pub const AVG_SUPPLY_GAP: &str = "AvgSupplyGap";
}

use columns::*;

/// The fixed set of tables the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    InventoryHealth,
    ReorderStatus,
    TurnoverByProduct,
    Top5Skus,
    Bottom5Skus,
    AgingInventory,
    ChronicUnderstock,
    TurnoverRegionCategory,
    WeatherImpact,
    SeasonalSales,
    SupplyDemandGap,
}

impl TableId {
    pub const ALL: [TableId; 11] = [
        TableId::InventoryHealth,
        TableId::ReorderStatus,
        TableId::TurnoverByProduct,
        TableId::Top5Skus,
        TableId::Bottom5Skus,
        TableId::AgingInventory,
        TableId::ChronicUnderstock,
        TableId::TurnoverRegionCategory,
        TableId::WeatherImpact,
        TableId::SeasonalSales,
        TableId::SupplyDemandGap,
    ];

    /// Stable identifier used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            TableId::InventoryHealth => "inventory_health",
            TableId::ReorderStatus => "reorder_status",
            TableId::TurnoverByProduct => "turnover_by_product",
            TableId::Top5Skus => "top5_skus",
            TableId::Bottom5Skus => "bottom5_skus",
            TableId::AgingInventory => "aging_inventory",
            TableId::ChronicUnderstock => "chronic_understock",
            TableId::TurnoverRegionCategory => "turnover_region_category",
            TableId::WeatherImpact => "weather_impact",
            TableId::SeasonalSales => "seasonal_sales",
            TableId::SupplyDemandGap => "supply_demand_gap",
        }
    }

    /// File name inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            TableId::InventoryHealth => "InventoryHealth.csv",
            TableId::ReorderStatus => "ReorderStatus.csv",
            TableId::TurnoverByProduct => "TurnoverByProduct.csv",
            TableId::Top5Skus => "Top5SKUs.csv",
            TableId::Bottom5Skus => "Bottom5SKUs.csv",
            TableId::AgingInventory => "AgingInventory.csv",
            TableId::ChronicUnderstock => "ChronicUnderstock.csv",
            TableId::TurnoverRegionCategory => "TurnoverByRegionCategory.csv",
            TableId::WeatherImpact => "WeatherImpact.csv",
            TableId::SeasonalSales => "SeasonalCategorySales.csv",
            TableId::SupplyDemandGap => "SupplyDemandGap.csv",
        }
    }

    pub fn schema(self) -> TableSchema {
        let (required, optional): (&'static [&'static str], &'static [&'static str]) = match self
        {
            TableId::InventoryHealth => (&[PRODUCT_ID, INVENTORY_STATUS], &[REGION]),
            TableId::ReorderStatus => (&[PRODUCT_ID, STATUS], &[]),
            TableId::TurnoverByProduct => (&[PRODUCT_ID, TURNOVER_RATIO], &[]),
            TableId::Top5Skus | TableId::Bottom5Skus => (&[PRODUCT_ID, TOTAL_SOLD], &[]),
            TableId::AgingInventory => (&[PRODUCT_ID, DAYS_HIGH_STOCK], &[]),
            TableId::ChronicUnderstock => (&[PRODUCT_ID, DAYS_BELOW_FORECAST], &[]),
            TableId::TurnoverRegionCategory => (&[REGION, CATEGORY, TURNOVER_RATIO], &[]),
            TableId::WeatherImpact => (&[WEATHER_CONDITION, AVG_UNITS_SOLD], &[]),
            TableId::SeasonalSales => (&[SEASONALITY, CATEGORY, TOTAL_SALES], &[]),
            TableId::SupplyDemandGap => (&[AVG_SUPPLY_GAP], &[PRODUCT_ID]),
        };
        TableSchema {
            table: self,
            required,
            optional,
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Required and optional columns of one table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: TableId,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl TableSchema {
    /// Checks a header row, failing on the first required column that is absent.
    pub fn validate<'h, I>(&self, headers: I) -> Result<(), DatasetError>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
        match self
            .required
            .iter()
            .copied()
            .find(|column| !present.contains(column))
        {
            Some(column) => Err(DatasetError::MissingColumn {
                table: self.table.name(),
                file: self.table.file_name(),
                column,
            }),
            None => Ok(()),
        }
    }

    pub fn is_optional(&self, column: &str) -> bool {
        self.optional.iter().any(|c| *c == column)
    }
}
