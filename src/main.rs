// Main module for the fraud statistics engine. Orchestrates data loading, one
// full recomputation pass, and result presentation.
use std::error::Error;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use aggregate::{class_summary, filter_rows_by_min_rate, group_by_dimension, Dimension, SortMode};
use csv_reader::{read_transactions, Transaction};
use density::{estimate_density, DEFAULT_GRID_SIZE};
use filter::{apply_filter, AmountBounds, FilterSpec, Measure};
use geo::{aggregate_by_region, concentration_index};
use threshold::classify_threshold;

mod aggregate;
mod calendar;
mod csv_reader;
mod density;
mod filter;
mod geo;
mod regions;
mod threshold;

const CSV_FILE_PATH: &str = "eda_fraud_balanced_sorted.csv";
const ALERT_THRESHOLD: f64 = 200.0;
const DENSITY_UPPER_BOUND: f64 = 1500.0;
const MIN_CATEGORY_RATE: f64 = 0.05;
const MAX_SAMPLE_SIZE: usize = 15_000;
const TOP_REGIONS: usize = 10;

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.2}%", rate * 100.0),
        None => "N/A".to_string(),
    }
}

fn fmt_amount(amount: Option<f64>) -> String {
    match amount {
        Some(amount) => format!("${amount:.2}"),
        None => "N/A".to_string(),
    }
}

// Displays overall view statistics and the per-class summary panel
// Inputs: full dataset and the filtered view
// Outputs: prints formatted overview to console
fn print_overview(dataset: &[Transaction], view: &[&Transaction]) {
    println!("Transactions analyzed: {} of {}", view.len(), dataset.len());
    let mut stamps = view.iter().filter_map(|tx| tx.timestamp);
    if let Some(first) = stamps.next() {
        let (min, max) = stamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        println!(
            "  Period: {} to {}",
            calendar::derive(min).iso_week,
            calendar::derive(max).iso_week,
        );
    }
    for class in class_summary(view) {
        println!(
            "  {}: {} transactions, avg {}, median {}",
            class.label,
            class.count,
            fmt_amount(class.mean_amount),
            fmt_amount(class.median_amount),
        );
    }
}

// Displays the day-of-week aggregate table in calendar order. Every day
// appears even when no transaction fell on it.
fn print_day_of_week(view: &[&Transaction]) {
    println!("\nFraud by Day of Week:");
    println!(
        "{:<10} {:>12} {:>8} {:>8} {:>12}",
        "Day", "Transactions", "Frauds", "Rate", "Avg Amount"
    );
    for row in group_by_dimension(view, Dimension::DayOfWeek, SortMode::Intrinsic) {
        println!(
            "{:<10} {:>12} {:>8} {:>8} {:>12}",
            row.key,
            row.count,
            row.positives,
            fmt_rate(row.rate),
            fmt_amount(row.mean_amount),
        );
    }
}

// Displays the riskiest hours of the day
// Inputs: filtered view
// Outputs: prints top hours ranked by fraud rate
// Key steps:
// 1. Group the view by hour with the ranking sort
// 2. Print the top entries with a measured rate
fn print_hourly(view: &[&Transaction]) {
    println!("\nRiskiest Hours:");
    let rows = group_by_dimension(view, Dimension::Hour, SortMode::RateDesc);
    for row in rows.iter().filter(|row| row.rate.is_some()).take(5) {
        println!(
            "  {:>2}:00 - {} of {} fraudulent ({})",
            row.key,
            row.positives,
            row.count,
            fmt_rate(row.rate),
        );
    }
}

// Displays merchant categories at or above the minimum fraud rate
fn print_categories(view: &[&Transaction]) {
    println!(
        "\nMerchant Categories (fraud rate >= {:.0}%):",
        MIN_CATEGORY_RATE * 100.0
    );
    let rows = group_by_dimension(view, Dimension::Category, SortMode::RateDesc);
    let flagged = filter_rows_by_min_rate(&rows, MIN_CATEGORY_RATE);
    if flagged.is_empty() {
        println!("  No categories match the selected criteria.");
    }
    for row in flagged {
        println!(
            "  {:<16} {} of {} fraudulent ({})",
            row.key,
            row.positives,
            row.count,
            fmt_rate(row.rate),
        );
    }
}

// Displays the alert-threshold panel
// Inputs: filtered view and the observed amount bounds
// Outputs: prints counts, rate, precision and recall for the threshold
// Key steps:
// 1. Clamp the configured threshold to the observed amount range
// 2. Partition the view at the threshold
// 3. Print each ratio, with N/A for undefined values
fn print_threshold(view: &[&Transaction], bounds: Option<AmountBounds>) {
    let threshold = match bounds {
        Some(bounds) => bounds.clamp(ALERT_THRESHOLD),
        None => ALERT_THRESHOLD,
    };
    let metrics = classify_threshold(view, Measure::Amount, threshold);
    println!("\nThreshold Analysis (${threshold:.0}):");
    println!("  Above threshold: {}", metrics.count_above);
    println!("  Fraudulent above: {}", metrics.positive_above);
    println!("  Rate: {}", fmt_rate(metrics.rate));
    println!("  Precision: {}", fmt_rate(metrics.precision));
    println!("  Recall: {}", fmt_rate(metrics.recall));
}

// Displays where each class's amount density peaks
fn print_density(view: &[&Transaction]) {
    println!("\nAmount Density (support $0-${DENSITY_UPPER_BOUND:.0}):");
    let curves = estimate_density(view, Measure::Amount, DENSITY_UPPER_BOUND, DEFAULT_GRID_SIZE);
    if curves.is_empty() {
        println!("  Not enough observations for a density estimate.");
    }
    for (label, curve) in curves {
        let peak = curve
            .xs
            .iter()
            .zip(curve.densities.iter())
            .fold((0.0, f64::MIN), |best, (&x, &d)| {
                if d > best.1 {
                    (x, d)
                } else {
                    best
                }
            });
        println!(
            "  {}: density peaks near ${:.0} ({} grid points)",
            label,
            peak.0,
            curve.xs.len(),
        );
    }
}

// Displays the regional ranking and the concentration index
// Inputs: filtered view
// Outputs: prints top regions by fraud rate and the geographic concentration
fn print_regions(view: &[&Transaction]) {
    println!("\nTop Regions by Fraud Rate:");
    let stats = aggregate_by_region(view);
    for (rank, stat) in stats.iter().take(TOP_REGIONS).enumerate() {
        println!(
            "  {:>2}. {:<16} {} ({} frauds of {})",
            rank + 1,
            stat.display_name,
            fmt_rate(stat.rate),
            stat.positives,
            stat.count,
        );
    }
    let highest = stats.iter().find(|s| s.rate.is_some());
    let safest = stats.iter().rev().find(|s| s.rate.is_some());
    if let (Some(highest), Some(safest)) = (highest, safest) {
        println!(
            "Highest risk: {} ({}), safest: {} ({})",
            highest.display_name,
            fmt_rate(highest.rate),
            safest.display_name,
            fmt_rate(safest.rate),
        );
    }
    match concentration_index(&stats) {
        Some(index) => println!("Geographic concentration: {index:.2}"),
        None => println!("Geographic concentration: N/A"),
    }
}

// Main entry point for the fraud statistics engine
// Inputs: optional dataset path as the first argument
// Outputs: Result indicating success or error
// Key steps:
// 1. Load and validate the transaction dataset
// 2. Build one FilterSpec and apply it
// 3. Run every aggregation over the filtered view
// 4. Display results
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CSV_FILE_PATH.to_string());
    let transactions = read_transactions(Path::new(&path))?;
    if transactions.is_empty() {
        println!("No transactions to analyze.");
        return Ok(());
    }

    let bounds = AmountBounds::from_dataset(&transactions);
    let spec = FilterSpec {
        sample_cap: Some(MAX_SAMPLE_SIZE),
        ..FilterSpec::default()
    };
    let view = apply_filter(&transactions, &spec);

    println!("Fraud Transaction Analysis");
    print_overview(&transactions, &view);
    print_day_of_week(&view);
    print_hourly(&view);
    print_categories(&view);
    print_threshold(&view, bounds);
    print_density(&view);
    print_regions(&view);

    Ok(())
}
