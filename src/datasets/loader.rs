//! CSV loader for the dashboard tables.
//!
//! Each table is read, schema-checked and parsed on its own. A table that
//! fails keeps its error in its slot; the remaining tables stay usable.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashSet,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::records::*;
use super::schema::{columns, TableId};
use crate::errors::DatasetError;
use crate::views;

/// A parsed table: its header row and typed records in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    id: TableId,
    columns: Vec<String>,
    rows: Vec<T>,
}

impl<T> Table<T> {
    pub fn new(id: TableId, columns: Vec<String>, rows: Vec<T>) -> Self {
        Self { id, columns, rows }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Rebuilds the rows while keeping the header.
    pub fn map_rows<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> Table<U> {
        Table {
            id: self.id,
            columns: self.columns,
            rows: f(self.rows),
        }
    }
}

pub type TableSlot<T> = Result<Table<T>, DatasetError>;

/// One snapshot of every input table.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub inventory_health: TableSlot<InventoryRecord>,
    pub reorder_status: TableSlot<ReorderRecord>,
    pub turnover_by_product: TableSlot<ProductTurnoverRecord>,
    pub top5_skus: TableSlot<RankedSkuRecord>,
    pub bottom5_skus: TableSlot<RankedSkuRecord>,
    pub aging_inventory: TableSlot<AgingRecord>,
    pub chronic_understock: TableSlot<UnderstockRecord>,
    pub turnover_region_category: TableSlot<RegionCategoryTurnover>,
    pub weather_impact: TableSlot<WeatherImpactRecord>,
    pub seasonal_sales: TableSlot<SeasonalSalesRecord>,
    pub supply_demand_gap: TableSlot<SupplyGapRecord>,
    pub source: PathBuf,
    pub loaded_at: DateTime<Utc>,
}

/// Load outcome of one table, as reported by health and reload endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableStatus {
    pub table: TableId,
    pub file: &'static str,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn slot<T>(slot: &TableSlot<T>) -> Result<&Table<T>, DatasetError> {
    slot.as_ref().map_err(DatasetError::clone)
}

fn status_of<T>(id: TableId, slot: &TableSlot<T>) -> TableStatus {
    TableStatus {
        table: id,
        file: id.file_name(),
        loaded: slot.is_ok(),
        rows: slot.as_ref().ok().map(Table::len),
        error: slot.as_ref().err().map(ToString::to_string),
    }
}

impl Datasets {
    pub fn inventory_health(&self) -> Result<&Table<InventoryRecord>, DatasetError> {
        slot(&self.inventory_health)
    }

    pub fn reorder_status(&self) -> Result<&Table<ReorderRecord>, DatasetError> {
        slot(&self.reorder_status)
    }

    pub fn turnover_by_product(&self) -> Result<&Table<ProductTurnoverRecord>, DatasetError> {
        slot(&self.turnover_by_product)
    }

    pub fn top5_skus(&self) -> Result<&Table<RankedSkuRecord>, DatasetError> {
        slot(&self.top5_skus)
    }

    pub fn bottom5_skus(&self) -> Result<&Table<RankedSkuRecord>, DatasetError> {
        slot(&self.bottom5_skus)
    }

    pub fn aging_inventory(&self) -> Result<&Table<AgingRecord>, DatasetError> {
        slot(&self.aging_inventory)
    }

    pub fn chronic_understock(&self) -> Result<&Table<UnderstockRecord>, DatasetError> {
        slot(&self.chronic_understock)
    }

    pub fn turnover_region_category(
        &self,
    ) -> Result<&Table<RegionCategoryTurnover>, DatasetError> {
        slot(&self.turnover_region_category)
    }

    pub fn weather_impact(&self) -> Result<&Table<WeatherImpactRecord>, DatasetError> {
        slot(&self.weather_impact)
    }

    pub fn seasonal_sales(&self) -> Result<&Table<SeasonalSalesRecord>, DatasetError> {
        slot(&self.seasonal_sales)
    }

    pub fn supply_demand_gap(&self) -> Result<&Table<SupplyGapRecord>, DatasetError> {
        slot(&self.supply_demand_gap)
    }

    /// Per-table load status in [`TableId::ALL`] order.
    pub fn status(&self) -> Vec<TableStatus> {
        vec![
            status_of(TableId::InventoryHealth, &self.inventory_health),
            status_of(TableId::ReorderStatus, &self.reorder_status),
            status_of(TableId::TurnoverByProduct, &self.turnover_by_product),
            status_of(TableId::Top5Skus, &self.top5_skus),
            status_of(TableId::Bottom5Skus, &self.bottom5_skus),
            status_of(TableId::AgingInventory, &self.aging_inventory),
            status_of(TableId::ChronicUnderstock, &self.chronic_understock),
            status_of(
                TableId::TurnoverRegionCategory,
                &self.turnover_region_category,
            ),
            status_of(TableId::WeatherImpact, &self.weather_impact),
            status_of(TableId::SeasonalSales, &self.seasonal_sales),
            status_of(TableId::SupplyDemandGap, &self.supply_demand_gap),
        ]
    }

    pub fn loaded_count(&self) -> usize {
        self.status().iter().filter(|s| s.loaded).count()
    }
}

/// Parses one table from any reader, validating the header first.
pub fn read_table<T, R>(id: TableId, reader: R) -> Result<Table<T>, DatasetError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| DatasetError::Parse {
            table: id.name(),
            line: 1,
            message: e.to_string(),
        })?
        .clone();

    id.schema().validate(headers.iter())?;

    let mut rows = Vec::new();
    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: T = result.map_err(|e: csv::Error| DatasetError::Parse {
            table: id.name(),
            line: e
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 2),
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    let columns = headers.iter().map(str::to_string).collect();
    Ok(Table::new(id, columns, rows))
}

/// Opens `<dir>/<file name>` and parses it.
pub fn load_table_file<T>(dir: &Path, id: TableId) -> Result<Table<T>, DatasetError>
where
    T: DeserializeOwned,
{
    let path = dir.join(id.file_name());
    let file = File::open(&path).map_err(|e| DatasetError::Io {
        table: id.name(),
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let table = read_table(id, file)?;
    debug!(table = %id, rows = table.len(), "table parsed");
    Ok(table)
}

/// Reads the supply gap table and attaches the gap type to every row.
pub fn read_supply_gap<R: Read>(reader: R) -> Result<Table<SupplyGapRecord>, DatasetError> {
    let raw: Table<SupplyGapRow> = read_table(TableId::SupplyDemandGap, reader)?;
    Ok(raw.map_rows(|rows| views::classify_gap(&rows)))
}

fn log_slot<T>(id: TableId, slot: &TableSlot<T>) {
    match slot {
        Ok(table) => info!(table = %id, rows = table.len(), "loaded table"),
        Err(err) => warn!(table = %id, error = %err, "table unavailable"),
    }
}

/// Loads every table from `dir`. Never fails as a whole.
pub fn load_datasets(dir: &Path) -> Datasets {
    info!(data_dir = %dir.display(), "loading dashboard datasets");

    let supply_demand_gap = File::open(dir.join(TableId::SupplyDemandGap.file_name()))
        .map_err(|e| DatasetError::Io {
            table: TableId::SupplyDemandGap.name(),
            path: dir
                .join(TableId::SupplyDemandGap.file_name())
                .display()
                .to_string(),
            message: e.to_string(),
        })
        .and_then(read_supply_gap);

    let datasets = Datasets {
        inventory_health: load_table_file(dir, TableId::InventoryHealth),
        reorder_status: load_table_file(dir, TableId::ReorderStatus),
        turnover_by_product: load_table_file(dir, TableId::TurnoverByProduct),
        top5_skus: load_table_file(dir, TableId::Top5Skus),
        bottom5_skus: load_table_file(dir, TableId::Bottom5Skus),
        aging_inventory: load_table_file(dir, TableId::AgingInventory),
        chronic_understock: load_table_file(dir, TableId::ChronicUnderstock),
        turnover_region_category: load_table_file(dir, TableId::TurnoverRegionCategory),
        weather_impact: load_table_file(dir, TableId::WeatherImpact),
        seasonal_sales: load_table_file(dir, TableId::SeasonalSales),
        supply_demand_gap,
        source: dir.to_path_buf(),
        loaded_at: Utc::now(),
    };

    log_slot(TableId::InventoryHealth, &datasets.inventory_health);
    log_slot(TableId::ReorderStatus, &datasets.reorder_status);
    log_slot(TableId::TurnoverByProduct, &datasets.turnover_by_product);
    log_slot(TableId::Top5Skus, &datasets.top5_skus);
    log_slot(TableId::Bottom5Skus, &datasets.bottom5_skus);
    log_slot(TableId::AgingInventory, &datasets.aging_inventory);
    log_slot(TableId::ChronicUnderstock, &datasets.chronic_understock);
    log_slot(
        TableId::TurnoverRegionCategory,
        &datasets.turnover_region_category,
    );
    log_slot(TableId::WeatherImpact, &datasets.weather_impact);
    log_slot(TableId::SeasonalSales, &datasets.seasonal_sales);
    log_slot(TableId::SupplyDemandGap, &datasets.supply_demand_gap);

    for mismatch in product_id_mismatches(&datasets) {
        warn!(
            table = %mismatch.table,
            reference = %mismatch.reference,
            unmatched = mismatch.unmatched.len(),
            "product ids not present in reference table"
        );
    }

    info!(
        loaded = datasets.loaded_count(),
        total = TableId::ALL.len(),
        "dashboard datasets ready"
    );
    datasets
}

/// ProductIDs of `table` that the reference table does not know.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMismatch {
    pub table: TableId,
    pub reference: TableId,
    pub unmatched: Vec<String>,
}

/// Compares the reorder and aging tables against inventory health.
///
/// Mismatches are reported, never enforced.
pub fn product_id_mismatches(datasets: &Datasets) -> Vec<ProductMismatch> {
    let Ok(inventory) = datasets.inventory_health() else {
        return Vec::new();
    };
    let known: HashSet<&str> = inventory
        .rows()
        .iter()
        .map(|r| r.product_id.as_str())
        .collect();

    let mut mismatches = Vec::new();
    let mut check = |table: TableId, ids: Vec<&str>| {
        let unmatched: Vec<String> = ids
            .into_iter()
            .filter(|id| !known.contains(id))
            .map(str::to_string)
            .collect();
        if !unmatched.is_empty() {
            mismatches.push(ProductMismatch {
                table,
                reference: TableId::InventoryHealth,
                unmatched,
            });
        }
    };

    if let Ok(reorder) = datasets.reorder_status() {
        check(
            TableId::ReorderStatus,
            reorder.rows().iter().map(|r| r.product_id.as_str()).collect(),
        );
    }
    if let Ok(aging) = datasets.aging_inventory() {
        check(
            TableId::AgingInventory,
            aging.rows().iter().map(|r| r.product_id.as_str()).collect(),
        );
    }

    mismatches
}

/// True when the inventory table carries the optional Region column.
pub fn has_region_column(table: &Table<InventoryRecord>) -> bool {
    table.has_column(columns::REGION)
}
