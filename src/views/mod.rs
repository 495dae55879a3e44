//! Pure view computations over loaded tables.
//!
//! Nothing in here performs I/O or keeps state: every function takes a
//! snapshot and returns a fresh value, so calling it twice with the same
//! input gives the same output.

use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;

use crate::datasets::{
    loader::has_region_column, AgingRecord, GapType, InventoryRecord, ReorderRecord,
    SupplyGapRecord, SupplyGapRow, Table, REORDER_NOW,
};

pub mod charts;

/// Sentinel accepted by the region and gap type selectors.
pub const ALL: &str = "All";
/// Aging inventory counts SKUs held at high stock for more days than this.
pub const AGING_THRESHOLD_DAYS: u32 = 14;
/// Chronic understock lists SKUs below forecast for at least this many days.
pub const UNDERSTOCK_MIN_DAYS: u32 = 7;

/// Number of records whose InventoryStatus equals `status`.
pub fn count_by_status(records: &[InventoryRecord], status: &str) -> usize {
    records
        .iter()
        .filter(|r| r.inventory_status == status)
        .count()
}

/// Number of records flagged "Reorder Now".
pub fn count_by_reorder_status(records: &[ReorderRecord]) -> usize {
    records.iter().filter(|r| r.status == REORDER_NOW).count()
}

/// Aging records above the threshold, longest-held first.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AgingCritical {
    pub count: usize,
    pub threshold_days: u32,
    pub records: Vec<AgingRecord>,
}

pub fn count_aging_critical(records: &[AgingRecord], threshold_days: u32) -> AgingCritical {
    let over: Vec<AgingRecord> = records
        .iter()
        .filter(|r| r.days_high_stock > threshold_days)
        .cloned()
        .collect();
    let records = sort_descending(&over, |r| r.days_high_stock);
    AgingCritical {
        count: records.len(),
        threshold_days,
        records,
    }
}

/// Region selector value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Region(String),
}

impl FromStr for RegionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("region must not be empty; use 'All' to disable the filter".to_string()),
            ALL => Ok(RegionFilter::All),
            region => Ok(RegionFilter::Region(region.to_string())),
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionFilter::All => f.write_str(ALL),
            RegionFilter::Region(region) => f.write_str(region),
        }
    }
}

/// Records of the selected region.
///
/// Returns the whole table for [`RegionFilter::All`] and when the table has no
/// Region column at all.
pub fn filter_by_region(
    table: &Table<InventoryRecord>,
    filter: &RegionFilter,
) -> Vec<InventoryRecord> {
    match filter {
        RegionFilter::Region(region) if has_region_column(table) => table
            .rows()
            .iter()
            .filter(|r| r.region.as_deref() == Some(region.as_str()))
            .cloned()
            .collect(),
        _ => table.rows().to_vec(),
    }
}

/// Distinct regions, sorted. `None` when the table has no Region column.
pub fn region_options(table: &Table<InventoryRecord>) -> Option<Vec<String>> {
    if !has_region_column(table) {
        return None;
    }
    let mut regions: Vec<String> = table
        .rows()
        .iter()
        .filter_map(|r| r.region.clone())
        .collect();
    regions.sort();
    regions.dedup();
    Some(regions)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Occurrences of each InventoryStatus value, most frequent first.
pub fn status_distribution(records: &[InventoryRecord]) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::new();
    for record in records {
        match counts
            .iter()
            .position(|c| c.status == record.inventory_status)
        {
            Some(index) => counts[index].count += 1,
            None => counts.push(StatusCount {
                status: record.inventory_status.clone(),
                count: 1,
            }),
        }
    }
    // stable: equal counts keep first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Stable descending sort on `key`; ties keep their input order.
pub fn sort_descending<T, K, F>(records: &[T], key: F) -> Vec<T>
where
    T: Clone,
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    sorted
}

/// Sparse row → column → value mapping. Missing cells are simply absent.
pub type Pivot = BTreeMap<String, BTreeMap<String, f64>>;

/// A (row, column) pair that appeared more than once while pivoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCell {
    pub row: String,
    pub column: String,
}

pub fn pivot<T, R, C, V>(
    records: &[T],
    row_key: R,
    col_key: C,
    value_key: V,
) -> Result<Pivot, DuplicateCell>
where
    R: Fn(&T) -> &str,
    C: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    let mut pivot = Pivot::new();
    for record in records {
        let row = row_key(record);
        let column = col_key(record);
        let cells = pivot.entry(row.to_string()).or_default();
        if cells.insert(column.to_string(), value_key(record)).is_some() {
            return Err(DuplicateCell {
                row: row.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(pivot)
}

/// Attaches the gap type to every raw supply gap row.
pub fn classify_gap(rows: &[SupplyGapRow]) -> Vec<SupplyGapRecord> {
    rows.iter()
        .map(|row| SupplyGapRecord {
            product_id: row.product_id.clone(),
            avg_supply_gap: row.avg_supply_gap,
            gap_type: GapType::from_supply_gap(row.avg_supply_gap),
        })
        .collect()
}

/// Gap type selector value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapFilter {
    #[default]
    All,
    Only(GapType),
}

impl FromStr for GapFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ALL => Ok(GapFilter::All),
            other => other.parse().map(GapFilter::Only),
        }
    }
}

impl fmt::Display for GapFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapFilter::All => f.write_str(ALL),
            GapFilter::Only(gap) => f.write_str(gap.as_str()),
        }
    }
}

pub fn filter_by_gap_type(records: &[SupplyGapRecord], filter: GapFilter) -> Vec<SupplyGapRecord> {
    match filter {
        GapFilter::All => records.to_vec(),
        GapFilter::Only(gap) => records
            .iter()
            .filter(|r| r.gap_type == gap)
            .cloned()
            .collect(),
    }
}

/// Gap types present in the data, in first-appearance order.
pub fn gap_type_options(records: &[SupplyGapRecord]) -> Vec<GapType> {
    let mut seen = Vec::new();
    for record in records {
        if !seen.contains(&record.gap_type) {
            seen.push(record.gap_type);
        }
    }
    seen
}

pub fn status_breakdown_title(filter: &RegionFilter) -> String {
    match filter {
        RegionFilter::All => "Inventory Status Breakdown".to_string(),
        RegionFilter::Region(region) => format!("Inventory Status Breakdown - {}", region),
    }
}

pub fn supply_gap_title(filter: GapFilter) -> String {
    match filter {
        GapFilter::All => "Supply Gap Distribution".to_string(),
        GapFilter::Only(gap) => format!("Supply Gap Distribution ({})", gap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{RegionCategoryTurnover, TableId, BELOW_THRESHOLD, SAFE};
    use assert_matches::assert_matches;

    fn inventory(rows: &[(&str, Option<&str>, &str)], with_region: bool) -> Table<InventoryRecord> {
        let mut columns = vec!["ProductID".to_string(), "InventoryStatus".to_string()];
        if with_region {
            columns.push("Region".to_string());
        }
        let rows = rows
            .iter()
            .map(|(id, region, status)| InventoryRecord {
                product_id: id.to_string(),
                region: region.map(str::to_string),
                inventory_status: status.to_string(),
            })
            .collect();
        Table::new(TableId::InventoryHealth, columns, rows)
    }

    fn aging(days: &[u32]) -> Vec<AgingRecord> {
        days.iter()
            .enumerate()
            .map(|(i, d)| AgingRecord {
                product_id: format!("P{}", i),
                days_high_stock: *d,
            })
            .collect()
    }

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
    fn kpi_counts_for_three_safe_two_below() {
        let table = inventory(
            &[
                ("P1", None, SAFE),
                ("P2", None, BELOW_THRESHOLD),
                ("P3", None, SAFE),
                ("P4", None, BELOW_THRESHOLD),
                ("P5", None, SAFE),
            ],
            false,
        );
        assert_eq!(count_by_status(table.rows(), SAFE), 3);
        assert_eq!(count_by_status(table.rows(), BELOW_THRESHOLD), 2);
    }

    #[test]
    fn counts_on_empty_tables_are_zero() {
        assert_eq!(count_by_status(&[], SAFE), 0);
        assert_eq!(count_by_reorder_status(&[]), 0);
        assert_eq!(count_aging_critical(&[], AGING_THRESHOLD_DAYS).count, 0);
        assert!(status_distribution(&[]).is_empty());
    }

    #[test]
    fn reorder_now_is_an_exact_match() {
        let records: Vec<ReorderRecord> = ["Reorder Now", "OK", "reorder now", "Reorder Now"]
            .iter()
            .enumerate()
            .map(|(i, s)| ReorderRecord {
                product_id: format!("P{}", i),
                status: s.to_string(),
            })
            .collect();
        assert_eq!(count_by_reorder_status(&records), 2);
    }

    #[test]
    fn aging_critical_is_strictly_above_threshold_and_sorted() {
        let critical = count_aging_critical(&aging(&[5, 20, 15, 14]), 14);
        assert_eq!(critical.count, 2);
        let days: Vec<u32> = critical.records.iter().map(|r| r.days_high_stock).collect();
        assert_eq!(days, vec![20, 15]);
    }

    #[test]
    fn sort_descending_keeps_tie_order() {
        let records = aging(&[3, 9, 3, 9, 1]);
        let sorted = sort_descending(&records, |r| r.days_high_stock);
        let ids: Vec<&str> = sorted.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P3", "P0", "P2", "P4"]);
        assert_eq!(sort_descending(&sorted, |r| r.days_high_stock), sorted);
    }

    #[test]
    fn region_filter_all_without_region_column_is_identity() {
        let table = inventory(&[("P1", None, SAFE), ("P2", None, BELOW_THRESHOLD)], false);
        assert_eq!(filter_by_region(&table, &RegionFilter::All), table.rows());
        assert_eq!(
            filter_by_region(&table, &RegionFilter::Region("North".into())),
            table.rows()
        );
        assert_eq!(region_options(&table), None);
    }

    #[test]
    fn region_filter_matches_exactly() {
        let table = inventory(
            &[
                ("P1", Some("North"), SAFE),
                ("P2", Some("South"), SAFE),
                ("P3", Some("North"), BELOW_THRESHOLD),
                ("P4", None, SAFE),
            ],
            true,
        );
        let north = filter_by_region(&table, &RegionFilter::Region("North".into()));
        assert_eq!(north.len(), 2);
        assert!(filter_by_region(&table, &RegionFilter::Region("north".into())).is_empty());
        assert_eq!(
            region_options(&table),
            Some(vec!["North".to_string(), "South".to_string()])
        );
    }

    #[test]
    fn region_filter_parsing() {
        assert_eq!("All".parse::<RegionFilter>(), Ok(RegionFilter::All));
        assert_eq!(
            " West ".parse::<RegionFilter>(),
            Ok(RegionFilter::Region("West".into()))
        );
        assert!("".parse::<RegionFilter>().is_err());
    }

    #[test]
    fn status_distribution_counts_each_value() {
        let table = inventory(
            &[
                ("P1", None, SAFE),
                ("P2", None, BELOW_THRESHOLD),
                ("P3", None, SAFE),
            ],
            false,
        );
        assert_eq!(
            status_distribution(table.rows()),
            vec![
                StatusCount {
                    status: SAFE.into(),
                    count: 2
                },
                StatusCount {
                    status: BELOW_THRESHOLD.into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn pivot_leaves_missing_cells_absent() {
        let records = vec![
            RegionCategoryTurnover {
                region: "North".into(),
                category: "Toys".into(),
                turnover_ratio: 1.5,
            },
            RegionCategoryTurnover {
                region: "South".into(),
                category: "Grocery".into(),
                turnover_ratio: 3.0,
            },
        ];
        let pivot = pivot(
            &records,
            |r| r.region.as_str(),
            |r| r.category.as_str(),
            |r| r.turnover_ratio,
        )
        .unwrap();
        assert_eq!(pivot["North"]["Toys"], 1.5);
        assert!(pivot["North"].get("Grocery").is_none());
        assert_eq!(pivot["South"].len(), 1);
    }

    #[test]
    fn pivot_of_nothing_is_empty() {
        let records: Vec<RegionCategoryTurnover> = Vec::new();
        let pivot = pivot(
            &records,
            |r| r.region.as_str(),
            |r| r.category.as_str(),
            |r| r.turnover_ratio,
        );
        assert_eq!(pivot, Ok(Pivot::new()));
    }

    #[test]
    fn pivot_rejects_duplicate_cells() {
        let cell = RegionCategoryTurnover {
            region: "North".into(),
            category: "Toys".into(),
            turnover_ratio: 1.0,
        };
        let records = vec![cell.clone(), cell];
        assert_matches!(
            pivot(
                &records,
                |r| r.region.as_str(),
                |r| r.category.as_str(),
                |r| r.turnover_ratio
            ),
            Err(DuplicateCell { ref row, ref column }) if row == "North" && column == "Toys"
        );
    }

    #[test]
    fn gap_classification_and_filtering() {
        let records = gaps(&[-5.0, 0.0, 3.0, -1.0]);
        let types: Vec<GapType> = records.iter().map(|r| r.gap_type).collect();
        assert_eq!(
            types,
            vec![
                GapType::Overstock,
                GapType::Understock,
                GapType::Understock,
                GapType::Overstock
            ]
        );

        let over = filter_by_gap_type(&records, GapFilter::Only(GapType::Overstock));
        assert_eq!(over.len(), 2);
        assert_eq!(
            filter_by_gap_type(&over, GapFilter::Only(GapType::Overstock)),
            over
        );
        assert_eq!(filter_by_gap_type(&records, GapFilter::All), records);
        assert_eq!(
            gap_type_options(&records),
            vec![GapType::Overstock, GapType::Understock]
        );
    }

    #[test]
    fn gap_filter_on_missing_type_is_empty() {
        let records = gaps(&[1.0, 2.0]);
        assert!(filter_by_gap_type(&records, GapFilter::Only(GapType::Overstock)).is_empty());
    }

    #[test]
    fn gap_filter_parsing() {
        assert_eq!("All".parse::<GapFilter>(), Ok(GapFilter::All));
        assert_eq!(
            "Understock".parse::<GapFilter>(),
            Ok(GapFilter::Only(GapType::Understock))
        );
        assert!("Sideways".parse::<GapFilter>().is_err());
    }

    #[test]
    fn titles_follow_the_selected_filter() {
        assert_eq!(
            status_breakdown_title(&RegionFilter::All),
            "Inventory Status Breakdown"
        );
        assert_eq!(
            status_breakdown_title(&RegionFilter::Region("East".into())),
            "Inventory Status Breakdown - East"
        );
        assert_eq!(
            supply_gap_title(GapFilter::Only(GapType::Overstock)),
            "Supply Gap Distribution (Overstock)"
        );
    }
}
