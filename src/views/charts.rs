//! Chart-ready shapes: bar series, grouped series, heat-map matrices and the
//! supply gap histogram with its box summary.

use serde::Serialize;
use utoipa::ToSchema;

use super::Pivot;
use crate::datasets::{GapType, SeasonalSalesRecord, SupplyGapRecord};

/// Default bin count of the supply gap histogram.
pub const GAP_HISTOGRAM_BINS: usize = 30;

/// Either a renderable payload or an explicit "no data" marker.
///
/// Filters that leave nothing to draw produce `NoData` so the presentation
/// layer shows a message instead of an empty chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ChartData<T> {
    Ready(T),
    NoData { message: String },
}

impl<T> ChartData<T> {
    pub fn no_data(message: impl Into<String>) -> Self {
        ChartData::NoData {
            message: message.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ChartData::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ChartData::Ready(data) => Some(data),
            ChartData::NoData { .. } => None,
        }
    }
}

impl<T> ChartData<Vec<T>> {
    /// `Ready` for a non-empty vector, `NoData` otherwise.
    pub fn from_rows(rows: Vec<T>, message: &str) -> Self {
        if rows.is_empty() {
            ChartData::no_data(message)
        } else {
            ChartData::Ready(rows)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// One bar per record, in input order.
pub fn bar_series<T, L, V>(records: &[T], label: L, value: V) -> Vec<SeriesPoint>
where
    L: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    records
        .iter()
        .map(|r| SeriesPoint {
            label: label(r).to_string(),
            value: value(r),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<SeriesPoint>,
}

/// Seasonal sales split into one series per category for a grouped bar chart.
/// Categories and points keep first-appearance order.
pub fn grouped_series(records: &[SeasonalSalesRecord]) -> Vec<CategorySeries> {
    let mut groups: Vec<CategorySeries> = Vec::new();
    for record in records {
        let point = SeriesPoint {
            label: record.seasonality.clone(),
            value: record.total_sales,
        };
        match groups.iter().position(|g| g.category == record.category) {
            Some(index) => groups[index].points.push(point),
            None => groups.push(CategorySeries {
                category: record.category.clone(),
                points: vec![point],
            }),
        }
    }
    groups
}

/// Dense rendering of a [`Pivot`] for heat maps.
///
/// `values[i][j]` is the cell for `rows[i]` × `columns[j]`, `None` where the
/// input had no record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TurnoverMatrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl TurnoverMatrix {
    pub fn from_pivot(pivot: &Pivot) -> Self {
        let rows: Vec<String> = pivot.keys().cloned().collect();
        let mut columns: Vec<String> = pivot
            .values()
            .flat_map(|cells| cells.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();

        let values = pivot
            .values()
            .map(|cells| columns.iter().map(|c| cells.get(c).copied()).collect())
            .collect();

        Self {
            rows,
            columns,
            values,
        }
    }

    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.rows.iter().position(|r| r == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub overstock: usize,
    pub understock: usize,
}

impl HistogramBin {
    pub fn total(&self) -> usize {
        self.overstock + self.understock
    }
}

/// Equal-width histogram of AvgSupplyGap over the observed range, counted per
/// gap type. Non-finite values are skipped; a single distinct value yields a
/// single bin.
pub fn gap_histogram(records: &[SupplyGapRecord], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<&SupplyGapRecord> = records
        .iter()
        .filter(|r| r.avg_supply_gap.is_finite())
        .collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (min, max) = finite.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
        (lo.min(r.avg_supply_gap), hi.max(r.avg_supply_gap))
    });
    // scale before subtracting so extreme finite ranges cannot overflow
    let width = max / bins as f64 - min / bins as f64;
    let bins = if width > 0.0 && width.is_finite() { bins } else { 1 };
    let width = if bins > 1 { width } else { 0.0 };

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            overstock: 0,
            understock: 0,
        })
        .collect();

    for record in finite {
        let index = if width > 0.0 {
            ((record.avg_supply_gap / width - min / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        match record.gap_type {
            GapType::Overstock => histogram[index].overstock += 1,
            GapType::Understock => histogram[index].understock += 1,
        }
    }
    histogram
}

/// Five-number summary of AvgSupplyGap for one gap type.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BoxSummary {
    pub gap_type: GapType,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear interpolation between order statistics. `sorted` must be non-empty.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Box summaries per gap type, in first-appearance order.
pub fn gap_box_summary(records: &[SupplyGapRecord]) -> Vec<BoxSummary> {
    super::gap_type_options(records)
        .into_iter()
        .filter_map(|gap_type| {
            let mut values: Vec<f64> = records
                .iter()
                .filter(|r| r.gap_type == gap_type && r.avg_supply_gap.is_finite())
                .map(|r| r.avg_supply_gap)
                .collect();
            if values.is_empty() {
                return None;
            }
            values.sort_by(f64::total_cmp);
            Some(BoxSummary {
                gap_type,
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::SupplyGapRow;
    use crate::views::{classify_gap, pivot};

    fn gaps(values: &[f64]) -> Vec<SupplyGapRecord> {
        let rows: Vec<SupplyGapRow> = values
            .iter()
            .map(|v| SupplyGapRow {
                product_id: None,
                avg_supply_gap: *v,
            })
            .collect();
        classify_gap(&rows)
    }

    #[test]
    fn chart_data_marks_empty_rows() {
        let empty: ChartData<Vec<u8>> = ChartData::from_rows(Vec::new(), "nothing");
        assert!(!empty.is_ready());
        assert_eq!(empty, ChartData::no_data("nothing"));

        let ready = ChartData::from_rows(vec![1u8], "nothing");
        assert_eq!(ready.ready(), Some(&vec![1u8]));
    }

    #[test]
    fn chart_data_serializes_with_state_tag() {
        let json = serde_json::to_value(ChartData::<Vec<u8>>::no_data("none")).unwrap();
        assert_eq!(json["state"], "no_data");
        assert_eq!(json["data"]["message"], "none");

        let json = serde_json::to_value(ChartData::Ready(vec![3u8])).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["data"][0], 3);
    }

    #[test]
    fn grouped_series_keeps_first_appearance_order() {
        let records: Vec<SeasonalSalesRecord> = [
            ("Winter", "Toys", 10.0),
            ("Winter", "Grocery", 30.0),
            ("Summer", "Toys", 12.0),
        ]
        .iter()
        .map(|(s, c, v)| SeasonalSalesRecord {
            seasonality: s.to_string(),
            category: c.to_string(),
            total_sales: *v,
        })
        .collect();

        let series = grouped_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].category, "Toys");
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[1].label, "Summer");
        assert_eq!(series[1].points[0].value, 30.0);
    }

    #[test]
    fn matrix_keeps_sparse_cells_empty() {
        let cells = [("North", "Toys", 1.0), ("South", "Grocery", 2.0)];
        let pivot = pivot(&cells, |c| c.0, |c| c.1, |c| c.2).unwrap();
        let matrix = TurnoverMatrix::from_pivot(&pivot);
        assert_eq!(matrix.rows, vec!["North", "South"]);
        assert_eq!(matrix.columns, vec!["Grocery", "Toys"]);
        assert_eq!(matrix.values, vec![vec![None, Some(1.0)], vec![Some(2.0), None]]);
        assert_eq!(matrix.cell("South", "Grocery"), Some(2.0));
        assert_eq!(matrix.cell("South", "Toys"), None);
    }

    #[test]
    fn histogram_counts_every_record_once() {
        let records = gaps(&[-5.0, 0.0, 3.0, -1.0, 3.0]);
        let histogram = gap_histogram(&records, GAP_HISTOGRAM_BINS);
        assert_eq!(histogram.len(), GAP_HISTOGRAM_BINS);
        assert_eq!(histogram.iter().map(HistogramBin::total).sum::<usize>(), 5);
        assert_eq!(histogram[0].start, -5.0);
        assert_eq!(histogram[0].overstock, 1);
        assert_eq!(histogram[GAP_HISTOGRAM_BINS - 1].end, 3.0);
        assert_eq!(histogram[GAP_HISTOGRAM_BINS - 1].understock, 2);
    }

    #[test]
    fn histogram_spans_extreme_finite_values() {
        let histogram = gap_histogram(&gaps(&[-1e308, 1e308]), GAP_HISTOGRAM_BINS);
        assert_eq!(histogram.len(), GAP_HISTOGRAM_BINS);
        assert!(histogram.iter().all(|b| b.start.is_finite() && b.end.is_finite()));
        assert_eq!(histogram[0].start, -1e308);
        assert_eq!(histogram[0].overstock, 1);
        assert_eq!(histogram[0].understock, 0);
        assert_eq!(histogram[GAP_HISTOGRAM_BINS - 1].end, 1e308);
        assert_eq!(histogram[GAP_HISTOGRAM_BINS - 1].understock, 1);
    }

    #[test]
    fn histogram_of_a_single_value_is_one_bin() {
        let histogram = gap_histogram(&gaps(&[2.0, 2.0]), GAP_HISTOGRAM_BINS);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].understock, 2);
        assert!(gap_histogram(&[], GAP_HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn box_summary_uses_linear_quartiles() {
        let records = gaps(&[1.0, 2.0, 3.0, 4.0, -2.0]);
        let summary = gap_box_summary(&records);
        assert_eq!(summary.len(), 2);

        let under = &summary[0];
        assert_eq!(under.gap_type, GapType::Understock);
        assert_eq!(under.count, 4);
        assert_eq!(under.min, 1.0);
        assert_eq!(under.q1, 1.75);
        assert_eq!(under.median, 2.5);
        assert_eq!(under.q3, 3.25);
        assert_eq!(under.max, 4.0);

        let over = &summary[1];
        assert_eq!(over.gap_type, GapType::Overstock);
        assert_eq!(over.median, -2.0);
    }
}
