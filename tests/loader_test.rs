mod common;

use assert_matches::assert_matches;
use common::{data_dir, data_dir_with, full_fixture};
use inventory_dashboard::{
    datasets::{
        load_datasets,
        loader::product_id_mismatches,
        DatasetCache, TableId,
    },
    errors::DatasetError,
};

#[test]
fn full_fixture_loads_every_table() {
    let dir = data_dir(&full_fixture());
    let datasets = load_datasets(dir.path());

    assert_eq!(datasets.loaded_count(), TableId::ALL.len());
    assert_eq!(datasets.inventory_health().unwrap().len(), 5);
    assert_eq!(datasets.supply_demand_gap().unwrap().len(), 4);
    assert!(datasets.status().iter().all(|s| s.loaded && s.error.is_none()));
}

#[test]
fn malformed_table_leaves_the_others_usable() {
    let dir = data_dir_with(&[(
        "WeatherImpact.csv",
        Some("WeatherCondition,AvgUnitsSold\nSunny,lots\n"),
    )]);
    let datasets = load_datasets(dir.path());

    assert_matches!(
        datasets.weather_impact(),
        Err(DatasetError::Parse {
            table: "weather_impact",
            line: 2,
            ..
        })
    );
    assert_eq!(datasets.loaded_count(), TableId::ALL.len() - 1);
    assert_eq!(datasets.top5_skus().unwrap().len(), 5);
}

#[test]
fn missing_required_column_names_table_and_column() {
    let dir = data_dir_with(&[("AgingInventory.csv", Some("ProductID,Days\nP1,5\n"))]);
    let datasets = load_datasets(dir.path());

    let err = datasets.aging_inventory().unwrap_err();
    assert_eq!(err.table(), "aging_inventory");
    assert_matches!(
        err,
        DatasetError::MissingColumn {
            column: "DaysHighStock",
            ..
        }
    );

    let status = datasets
        .status()
        .into_iter()
        .find(|s| s.table == TableId::AgingInventory)
        .unwrap();
    assert!(!status.loaded);
    assert!(status.error.unwrap().contains("DaysHighStock"));
}

#[test]
fn headers_are_trimmed_before_validation() {
    let dir = data_dir_with(&[(
        "ReorderStatus.csv",
        Some(" ProductID , Status \nP1, Reorder Now \n"),
    )]);
    let datasets = load_datasets(dir.path());
    let reorder = datasets.reorder_status().unwrap();
    assert_eq!(reorder.rows()[0].status, "Reorder Now");
}

#[test]
fn mismatched_product_ids_are_reported_not_fatal() {
    let dir = data_dir_with(&[(
        "AgingInventory.csv",
        Some("ProductID,DaysHighStock\nP1,5\nP77,30\n"),
    )]);
    let datasets = load_datasets(dir.path());
    assert!(datasets.aging_inventory().is_ok());

    let mismatches = product_id_mismatches(&datasets);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].table, TableId::AgingInventory);
    assert_eq!(mismatches[0].unmatched, vec!["P77".to_string()]);
}

#[test]
fn supply_gap_without_product_column_loads() {
    let dir = data_dir_with(&[("SupplyDemandGap.csv", Some("AvgSupplyGap\n-2.5\n4\n"))]);
    let datasets = load_datasets(dir.path());
    let gaps = datasets.supply_demand_gap().unwrap();
    assert_eq!(gaps.len(), 2);
    assert!(gaps.rows().iter().all(|r| r.product_id.is_none()));
}

#[tokio::test]
async fn cache_serves_a_shared_snapshot() {
    let dir = data_dir(&full_fixture());
    let cache = DatasetCache::new(dir.path());

    let first = cache.get().await.unwrap();
    let second = cache.get().await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.loaded_count(), TableId::ALL.len());
}
