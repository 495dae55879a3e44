use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use inventory_dashboard::{
    config,
    datasets::{load_datasets, Datasets},
    errors::ServiceError,
    services::dashboard::{self, BarChartView},
    views::{charts::ChartData, GapFilter, RegionFilter},
};
use serde::Serialize;
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "dashboard-report",
    about = "Render the inventory dashboard views from a directory of CSV files",
    version
)]
struct Cli {
    #[arg(long, default_value = "data", help = "Directory holding the dashboard CSV files")]
    data_dir: PathBuf,
    #[arg(long, default_value = "All", help = "Region for the status breakdown")]
    region: String,
    #[arg(long, default_value = "All", help = "Gap type: All, Overstock or Understock")]
    gap_type: String,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[arg(long, default_value = "warn", help = "Log level for diagnostics on stderr")]
    log_level: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// KPI cards
    Kpis,
    /// Chronic understock and aging inventory tables
    Tables,
    /// Every chart view
    Charts,
    /// Everything
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_tracing(&cli.log_level, false);

    let region = cli
        .region
        .parse::<RegionFilter>()
        .map_err(anyhow::Error::msg)
        .context("invalid --region")?;
    let gap = cli
        .gap_type
        .parse::<GapFilter>()
        .map_err(anyhow::Error::msg)
        .context("invalid --gap-type")?;

    let datasets = load_datasets(&cli.data_dir);
    let command = cli.command.unwrap_or(Commands::All);

    if cli.json {
        let output = match command {
            Commands::Kpis => json!({ "kpis": outcome(dashboard::kpis(&datasets)) }),
            Commands::Tables => json!({
                "chronic_understock": outcome(dashboard::chronic_understock(&datasets)),
                "aging_inventory": outcome(dashboard::aging_inventory(&datasets)),
            }),
            Commands::Charts => charts_json(&datasets, &region, gap),
            Commands::All => serde_json::to_value(dashboard::overview(&datasets, &region, gap))?,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Inventory dashboard ({})", cli.data_dir.display());
    if matches!(command, Commands::Kpis | Commands::All) {
        print_kpis(&datasets);
    }
    if matches!(command, Commands::Charts | Commands::All) {
        print_charts(&datasets, &region, gap);
    }
    if matches!(command, Commands::Tables | Commands::All) {
        print_tables(&datasets);
    }
    Ok(())
}

fn outcome<T: Serialize>(result: Result<T, ServiceError>) -> serde_json::Value {
    match result {
        Ok(view) => json!({ "status": "ok", "view": view }),
        Err(err) => json!({ "status": "error", "view": { "message": err.to_string() } }),
    }
}

fn charts_json(datasets: &Datasets, region: &RegionFilter, gap: GapFilter) -> serde_json::Value {
    json!({
        "top_skus": outcome(dashboard::top_skus(datasets)),
        "bottom_skus": outcome(dashboard::bottom_skus(datasets)),
        "status_distribution": outcome(dashboard::status_distribution(datasets, region)),
        "product_turnover": outcome(dashboard::product_turnover(datasets)),
        "region_category_turnover": outcome(dashboard::region_category_turnover(datasets)),
        "weather_impact": outcome(dashboard::weather_impact(datasets)),
        "seasonal_sales": outcome(dashboard::seasonal_sales(datasets)),
        "supply_gap": outcome(dashboard::supply_gap(datasets, gap)),
    })
}

fn section(title: &str) {
    println!();
    println!("== {} ==", title);
}

fn print_error(err: &ServiceError) {
    println!("  unavailable: {}", err);
}

fn print_kpis(datasets: &Datasets) {
    section("KPIs");
    match dashboard::kpis(datasets) {
        Ok(kpis) => {
            println!("  SKUs Below Threshold : {}", kpis.below_threshold_skus);
            println!("  Safe SKUs            : {}", kpis.safe_skus);
            println!("  Reorder Now          : {}", kpis.reorder_now);
            println!(
                "  Aging Inventory (>{}d): {}",
                kpis.aging_threshold_days, kpis.aging_inventory
            );
        }
        Err(err) => print_error(&err),
    }
}

fn print_bar_chart(result: Result<BarChartView, ServiceError>) {
    match result {
        Ok(chart) => {
            section(&chart.title);
            for point in &chart.series {
                println!("  {:<20} {:>12.2}", point.label, point.value);
            }
        }
        Err(err) => {
            section("Chart");
            print_error(&err);
        }
    }
}

fn print_charts(datasets: &Datasets, region: &RegionFilter, gap: GapFilter) {
    print_bar_chart(dashboard::top_skus(datasets));
    print_bar_chart(dashboard::bottom_skus(datasets));

    match dashboard::status_distribution(datasets, region) {
        Ok(view) => {
            section(&view.title);
            match &view.distribution {
                ChartData::Ready(counts) => {
                    for count in counts {
                        println!("  {:<20} {:>6}", count.status, count.count);
                    }
                }
                ChartData::NoData { message } => println!("  {}", message),
            }
        }
        Err(err) => {
            section("Inventory Status Breakdown");
            print_error(&err);
        }
    }

    print_bar_chart(dashboard::product_turnover(datasets));

    match dashboard::region_category_turnover(datasets) {
        Ok(heatmap) => {
            section(&heatmap.title);
            println!("  {:<14} {}", "", heatmap.matrix.columns.join(" | "));
            for (row, values) in heatmap.matrix.rows.iter().zip(&heatmap.matrix.values) {
                let cells: Vec<String> = values
                    .iter()
                    .map(|v| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v)))
                    .collect();
                println!("  {:<14} {}", row, cells.join(" | "));
            }
        }
        Err(err) => {
            section("Inventory Turnover by Region & Category");
            print_error(&err);
        }
    }

    print_bar_chart(dashboard::weather_impact(datasets));

    match dashboard::seasonal_sales(datasets) {
        Ok(chart) => {
            section(&chart.title);
            for series in &chart.series {
                let points: Vec<String> = series
                    .points
                    .iter()
                    .map(|p| format!("{}={:.2}", p.label, p.value))
                    .collect();
                println!("  {:<14} {}", series.category, points.join(", "));
            }
        }
        Err(err) => {
            section("Seasonal Sales by Category");
            print_error(&err);
        }
    }

    match dashboard::supply_gap(datasets, gap) {
        Ok(view) => {
            section(&view.title);
            match &view.chart {
                ChartData::Ready(chart) => {
                    for summary in &chart.box_summary {
                        println!(
                            "  {:<10} n={:<5} min={:.2} q1={:.2} median={:.2} q3={:.2} max={:.2}",
                            summary.gap_type,
                            summary.count,
                            summary.min,
                            summary.q1,
                            summary.median,
                            summary.q3,
                            summary.max
                        );
                    }
                }
                ChartData::NoData { message } => println!("  {}", message),
            }
        }
        Err(err) => {
            section("Supply Gap Distribution");
            print_error(&err);
        }
    }
}

fn print_tables(datasets: &Datasets) {
    match dashboard::chronic_understock(datasets) {
        Ok(table) => {
            section(&table.title);
            for record in &table.records {
                println!("  {:<14} {:>6}", record.product_id, record.days_below_forecast);
            }
        }
        Err(err) => {
            section("Chronic Understock");
            print_error(&err);
        }
    }

    match dashboard::aging_inventory(datasets) {
        Ok(table) => {
            section(&table.title);
            for record in &table.records {
                println!("  {:<14} {:>6}", record.product_id, record.days_high_stock);
            }
        }
        Err(err) => {
            section("Aging Inventory");
            print_error(&err);
        }
    }
}
