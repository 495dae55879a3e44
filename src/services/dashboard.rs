use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    datasets::{
        loader::has_region_column, AgingRecord, DatasetCache, Datasets, RankedSkuRecord, SupplyGapRecord, TableStatus,
        UnderstockRecord, BELOW_THRESHOLD, SAFE,
    },
    errors::{DatasetError, ServiceError},
    views::{
        self,
        charts::{
            bar_series, gap_box_summary, gap_histogram, grouped_series, BoxSummary,
            CategorySeries, ChartData, HistogramBin, SeriesPoint, TurnoverMatrix,
            GAP_HISTOGRAM_BINS,
        },
        GapFilter, RegionFilter, StatusCount, AGING_THRESHOLD_DAYS, ALL, UNDERSTOCK_MIN_DAYS,
    },
};

pub const NO_REGION_DATA: &str = "No data available for the selected Region.";
pub const NO_GAP_DATA: &str = "No data available for the selected Gap Type.";
pub const NO_DATA: &str = "No data available.";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct KpiSummary {
    pub below_threshold_skus: usize,
    pub safe_skus: usize,
    pub reorder_now: usize,
    pub aging_inventory: usize,
    pub aging_threshold_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusDistributionView {
    pub region: String,
    pub title: String,
    pub distribution: ChartData<Vec<StatusCount>>,
}

/// Region selector entries. `filter_available` is false when the inventory
/// table has no Region column, in which case only "All" is offered.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RegionOptions {
    pub filter_available: bool,
    pub options: Vec<String>,
}

/// A titled single-series bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BarChartView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HeatmapView {
    pub title: String,
    pub matrix: TurnoverMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupedBarChartView {
    pub title: String,
    pub series: Vec<CategorySeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SupplyGapChart {
    pub records: Vec<SupplyGapRecord>,
    pub histogram: Vec<HistogramBin>,
    pub box_summary: Vec<BoxSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SupplyGapView {
    pub gap_type: String,
    pub title: String,
    pub options: Vec<String>,
    pub chart: ChartData<SupplyGapChart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UnderstockTableView {
    pub title: String,
    pub min_days: u32,
    pub records: Vec<UnderstockRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgingTableView {
    pub title: String,
    pub threshold_days: u32,
    pub count: usize,
    pub records: Vec<AgingRecord>,
}

/// Result of one view inside the overview. A failed view carries its error
/// message and leaves the others intact.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", content = "view", rename_all = "snake_case")]
pub enum ViewOutcome<T> {
    Ok(T),
    Error { message: String },
}

impl<T> From<Result<T, ServiceError>> for ViewOutcome<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(view) => ViewOutcome::Ok(view),
            Err(err) => ViewOutcome::Error {
                message: err.to_string(),
            },
        }
    }
}

impl<T> ViewOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ViewOutcome::Ok(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub generated_at: DateTime<Utc>,
    pub data_loaded_at: DateTime<Utc>,
    pub kpis: ViewOutcome<KpiSummary>,
    pub top_skus: ViewOutcome<BarChartView>,
    pub bottom_skus: ViewOutcome<BarChartView>,
    pub regions: ViewOutcome<RegionOptions>,
    pub status_distribution: ViewOutcome<StatusDistributionView>,
    pub product_turnover: ViewOutcome<BarChartView>,
    pub region_category_turnover: ViewOutcome<HeatmapView>,
    pub weather_impact: ViewOutcome<BarChartView>,
    pub seasonal_sales: ViewOutcome<GroupedBarChartView>,
    pub supply_gap: ViewOutcome<SupplyGapView>,
    pub chronic_understock: ViewOutcome<UnderstockTableView>,
    pub aging_inventory: ViewOutcome<AgingTableView>,
}

pub fn kpis(datasets: &Datasets) -> Result<KpiSummary, ServiceError> {
    let inventory = datasets.inventory_health()?;
    let reorder = datasets.reorder_status()?;
    let aging = datasets.aging_inventory()?;

    Ok(KpiSummary {
        below_threshold_skus: views::count_by_status(inventory.rows(), BELOW_THRESHOLD),
        safe_skus: views::count_by_status(inventory.rows(), SAFE),
        reorder_now: views::count_by_reorder_status(reorder.rows()),
        aging_inventory: views::count_aging_critical(aging.rows(), AGING_THRESHOLD_DAYS).count,
        aging_threshold_days: AGING_THRESHOLD_DAYS,
    })
}

pub fn regions(datasets: &Datasets) -> Result<RegionOptions, ServiceError> {
    let inventory = datasets.inventory_health()?;
    let found = views::region_options(inventory);
    let filter_available = found.is_some();
    let options = std::iter::once(ALL.to_string())
        .chain(found.unwrap_or_default())
        .collect();
    Ok(RegionOptions {
        filter_available,
        options,
    })
}

pub fn status_distribution(
    datasets: &Datasets,
    region: &RegionFilter,
) -> Result<StatusDistributionView, ServiceError> {
    let inventory = datasets.inventory_health()?;
    // without a Region column the whole table is shown, so label it as such
    let region = if has_region_column(inventory) {
        region
    } else {
        &RegionFilter::All
    };
    let filtered = views::filter_by_region(inventory, region);
    let empty_message = match region {
        RegionFilter::All => NO_DATA,
        RegionFilter::Region(_) => NO_REGION_DATA,
    };
    Ok(StatusDistributionView {
        region: region.to_string(),
        title: views::status_breakdown_title(region),
        distribution: ChartData::from_rows(views::status_distribution(&filtered), empty_message),
    })
}

fn ranked_skus(title: &str, table: &[RankedSkuRecord]) -> BarChartView {
    BarChartView {
        title: title.to_string(),
        x_label: "ProductID".to_string(),
        y_label: "TotalSold".to_string(),
        series: bar_series(table, |r| r.product_id.as_str(), |r| r.total_sold),
    }
}

pub fn top_skus(datasets: &Datasets) -> Result<BarChartView, ServiceError> {
    Ok(ranked_skus("Top 5 SKUs", datasets.top5_skus()?.rows()))
}

pub fn bottom_skus(datasets: &Datasets) -> Result<BarChartView, ServiceError> {
    Ok(ranked_skus("Bottom 5 SKUs", datasets.bottom5_skus()?.rows()))
}

pub fn product_turnover(datasets: &Datasets) -> Result<BarChartView, ServiceError> {
    let table = datasets.turnover_by_product()?;
    Ok(BarChartView {
        title: "Inventory Turnover by Product".to_string(),
        x_label: "ProductID".to_string(),
        y_label: "TurnoverRatio".to_string(),
        series: bar_series(
            table.rows(),
            |r| r.product_id.as_str(),
            |r| r.turnover_ratio,
        ),
    })
}

pub fn region_category_turnover(datasets: &Datasets) -> Result<HeatmapView, ServiceError> {
    let table = datasets.turnover_region_category()?;
    let pivot = views::pivot(
        table.rows(),
        |r| r.region.as_str(),
        |r| r.category.as_str(),
        |r| r.turnover_ratio,
    )
    .map_err(|dup| DatasetError::DuplicateEntry {
        table: table.id().name(),
        row: dup.row,
        column: dup.column,
    })?;

    Ok(HeatmapView {
        title: "Inventory Turnover by Region & Category".to_string(),
        matrix: TurnoverMatrix::from_pivot(&pivot),
    })
}

pub fn weather_impact(datasets: &Datasets) -> Result<BarChartView, ServiceError> {
    let table = datasets.weather_impact()?;
    Ok(BarChartView {
        title: "Avg Units Sold by Weather".to_string(),
        x_label: "WeatherCondition".to_string(),
        y_label: "Avg Units Sold".to_string(),
        series: bar_series(
            table.rows(),
            |r| r.weather_condition.as_str(),
            |r| r.avg_units_sold,
        ),
    })
}

pub fn seasonal_sales(datasets: &Datasets) -> Result<GroupedBarChartView, ServiceError> {
    let table = datasets.seasonal_sales()?;
    Ok(GroupedBarChartView {
        title: "Seasonal Sales by Category".to_string(),
        series: grouped_series(table.rows()),
    })
}

pub fn supply_gap(datasets: &Datasets, filter: GapFilter) -> Result<SupplyGapView, ServiceError> {
    let table = datasets.supply_demand_gap()?;
    let filtered = views::filter_by_gap_type(table.rows(), filter);
    let options = std::iter::once(ALL.to_string())
        .chain(
            views::gap_type_options(table.rows())
                .into_iter()
                .map(|g| g.to_string()),
        )
        .collect();

    let chart = if filtered.is_empty() {
        ChartData::no_data(match filter {
            GapFilter::All => NO_DATA,
            GapFilter::Only(_) => NO_GAP_DATA,
        })
    } else {
        ChartData::Ready(SupplyGapChart {
            histogram: gap_histogram(&filtered, GAP_HISTOGRAM_BINS),
            box_summary: gap_box_summary(&filtered),
            records: filtered,
        })
    };

    Ok(SupplyGapView {
        gap_type: filter.to_string(),
        title: views::supply_gap_title(filter),
        options,
        chart,
    })
}

pub fn chronic_understock(datasets: &Datasets) -> Result<UnderstockTableView, ServiceError> {
    let table = datasets.chronic_understock()?;
    Ok(UnderstockTableView {
        title: format!("Chronic Understock ({}+ Days)", UNDERSTOCK_MIN_DAYS),
        min_days: UNDERSTOCK_MIN_DAYS,
        records: views::sort_descending(table.rows(), |r| r.days_below_forecast),
    })
}

pub fn aging_inventory(datasets: &Datasets) -> Result<AgingTableView, ServiceError> {
    let table = datasets.aging_inventory()?;
    let critical = views::count_aging_critical(table.rows(), AGING_THRESHOLD_DAYS);
    Ok(AgingTableView {
        title: format!("Aging Inventory (High Stock > {} Days)", AGING_THRESHOLD_DAYS),
        threshold_days: critical.threshold_days,
        count: critical.count,
        records: critical.records,
    })
}

/// Every view at once; failures are reported per view.
pub fn overview(datasets: &Datasets, region: &RegionFilter, gap: GapFilter) -> DashboardOverview {
    DashboardOverview {
        generated_at: Utc::now(),
        data_loaded_at: datasets.loaded_at,
        kpis: kpis(datasets).into(),
        top_skus: top_skus(datasets).into(),
        bottom_skus: bottom_skus(datasets).into(),
        regions: regions(datasets).into(),
        status_distribution: status_distribution(datasets, region).into(),
        product_turnover: product_turnover(datasets).into(),
        region_category_turnover: region_category_turnover(datasets).into(),
        weather_impact: weather_impact(datasets).into(),
        seasonal_sales: seasonal_sales(datasets).into(),
        supply_gap: supply_gap(datasets, gap).into(),
        chronic_understock: chronic_understock(datasets).into(),
        aging_inventory: aging_inventory(datasets).into(),
    }
}

/// Dashboard service for the HTTP handlers, backed by the dataset cache.
#[derive(Clone, Debug)]
pub struct DashboardService {
    cache: DatasetCache,
}

impl DashboardService {
    pub fn new(cache: DatasetCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    async fn snapshot(&self) -> Result<Arc<Datasets>, ServiceError> {
        self.cache.get().await
    }

    pub async fn get_kpis(&self) -> Result<KpiSummary, ServiceError> {
        kpis(&*self.snapshot().await?)
    }

    pub async fn get_regions(&self) -> Result<RegionOptions, ServiceError> {
        regions(&*self.snapshot().await?)
    }

    pub async fn get_status_distribution(
        &self,
        region: &RegionFilter,
    ) -> Result<StatusDistributionView, ServiceError> {
        status_distribution(&*self.snapshot().await?, region)
    }

    pub async fn get_top_skus(&self) -> Result<BarChartView, ServiceError> {
        top_skus(&*self.snapshot().await?)
    }

    pub async fn get_bottom_skus(&self) -> Result<BarChartView, ServiceError> {
        bottom_skus(&*self.snapshot().await?)
    }

    pub async fn get_product_turnover(&self) -> Result<BarChartView, ServiceError> {
        product_turnover(&*self.snapshot().await?)
    }

    pub async fn get_region_category_turnover(&self) -> Result<HeatmapView, ServiceError> {
        region_category_turnover(&*self.snapshot().await?)
    }

    pub async fn get_weather_impact(&self) -> Result<BarChartView, ServiceError> {
        weather_impact(&*self.snapshot().await?)
    }

    pub async fn get_seasonal_sales(&self) -> Result<GroupedBarChartView, ServiceError> {
        seasonal_sales(&*self.snapshot().await?)
    }

    pub async fn get_supply_gap(&self, filter: GapFilter) -> Result<SupplyGapView, ServiceError> {
        supply_gap(&*self.snapshot().await?, filter)
    }

    pub async fn get_chronic_understock(&self) -> Result<UnderstockTableView, ServiceError> {
        chronic_understock(&*self.snapshot().await?)
    }

    pub async fn get_aging_inventory(&self) -> Result<AgingTableView, ServiceError> {
        aging_inventory(&*self.snapshot().await?)
    }

    #[instrument(skip(self))]
    pub async fn get_overview(
        &self,
        region: &RegionFilter,
        gap: GapFilter,
    ) -> Result<DashboardOverview, ServiceError> {
        info!("Generating dashboard overview");
        Ok(overview(&*self.snapshot().await?, region, gap))
    }

    pub async fn table_status(&self) -> Result<Vec<TableStatus>, ServiceError> {
        Ok(self.snapshot().await?.status())
    }

    /// Re-reads every file and returns the new per-table status.
    pub async fn reload(&self) -> Result<Vec<TableStatus>, ServiceError> {
        Ok(self.cache.reload().await?.status())
    }
}
