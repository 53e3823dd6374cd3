use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::Timelike;
use serde::Serialize;

use crate::calendar::{self, DAY_NAMES, MONTH_NAMES};
use crate::csv_reader::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Hour,
    DayOfWeek,
    Month,
    IsoWeek,
    Category,
    Region,
}

// Intrinsic keeps the dimension's canonical order (calendar order for the
// fixed domains, ascending key otherwise); the other two are ranking sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortMode {
    Intrinsic,
    RateDesc,
    CountDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub count: usize,
    pub positives: usize,
    /// positives/count; `None` when the group is empty. An empty group was
    /// not measured, which is not the same as measuring a rate of zero.
    pub rate: Option<f64>,
    pub total_amount: f64,
    pub mean_amount: Option<f64>,
    /// Population standard deviation of the amount; `None` when empty.
    pub std_amount: Option<f64>,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    positives: usize,
    sum: f64,
    sum_sq: f64,
}

impl Accumulator {
    fn add(&mut self, tx: &Transaction) {
        self.count += 1;
        if tx.is_fraud {
            self.positives += 1;
        }
        self.sum += tx.amount;
        self.sum_sq += tx.amount * tx.amount;
    }

    fn into_row(self, key: String) -> AggregateRow {
        let (rate, mean_amount, std_amount) = if self.count > 0 {
            let n = self.count as f64;
            let mean = self.sum / n;
            let variance = (self.sum_sq / n - mean * mean).max(0.0);
            (
                Some(self.positives as f64 / n),
                Some(mean),
                Some(variance.sqrt()),
            )
        } else {
            (None, None, None)
        };
        AggregateRow {
            key,
            count: self.count,
            positives: self.positives,
            rate,
            total_amount: self.sum,
            mean_amount,
            std_amount,
        }
    }
}

// Records without a parseable timestamp have no key on the time dimensions
// and drop out of those groupings only.
fn key_of(tx: &Transaction, dimension: Dimension) -> Option<String> {
    match dimension {
        Dimension::Hour => tx.timestamp.map(|ts| ts.hour().to_string()),
        Dimension::DayOfWeek => tx.timestamp.map(|ts| calendar::day_name(ts).to_string()),
        Dimension::Month => tx.timestamp.map(|ts| calendar::month_name(ts).to_string()),
        Dimension::IsoWeek => tx.timestamp.map(calendar::iso_week_id),
        Dimension::Category => Some(tx.category.clone()),
        Dimension::Region => Some(tx.state.clone()),
    }
}

// Full ordered key set for the small fixed domains; open domains return None
// and list observed keys only.
fn fixed_domain(dimension: Dimension) -> Option<Vec<String>> {
    match dimension {
        Dimension::Hour => Some((0..24).map(|h| h.to_string()).collect()),
        Dimension::DayOfWeek => Some(DAY_NAMES.iter().map(|d| d.to_string()).collect()),
        Dimension::Month => Some(MONTH_NAMES.iter().map(|m| m.to_string()).collect()),
        Dimension::IsoWeek | Dimension::Category | Dimension::Region => None,
    }
}

fn cmp_rate_desc(a: &AggregateRow, b: &AggregateRow) -> Ordering {
    match (a.rate, b.rate) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// Partitions the view by the grouping dimension and computes per-group
// statistics in a single accumulation pass.
pub fn group_by_dimension(
    view: &[&Transaction],
    dimension: Dimension,
    sort: SortMode,
) -> Vec<AggregateRow> {
    let mut groups: HashMap<String, Accumulator> = HashMap::new();
    for tx in view {
        let Some(key) = key_of(tx, dimension) else {
            continue;
        };
        groups.entry(key).or_default().add(tx);
    }

    let mut rows: Vec<AggregateRow> = match fixed_domain(dimension) {
        Some(domain) => domain
            .into_iter()
            .map(|key| {
                let acc = groups.remove(&key).unwrap_or_default();
                acc.into_row(key)
            })
            .collect(),
        None => {
            let mut rows: Vec<AggregateRow> = groups
                .into_iter()
                .map(|(key, acc)| acc.into_row(key))
                .collect();
            rows.sort_by(|a, b| a.key.cmp(&b.key));
            rows
        }
    };

    // Vec::sort_by is stable; ties keep the intrinsic order.
    match sort {
        SortMode::Intrinsic => {}
        SortMode::RateDesc => rows.sort_by(cmp_rate_desc),
        SortMode::CountDesc => rows.sort_by(|a, b| b.count.cmp(&a.count)),
    }
    rows
}

// Keeps rows whose measured rate reaches the cut. Rows with an undefined
// rate carry no evidence and are dropped.
pub fn filter_rows_by_min_rate(rows: &[AggregateRow], min_rate: f64) -> Vec<AggregateRow> {
    rows.iter()
        .filter(|row| row.rate.is_some_and(|rate| rate >= min_rate))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub label: String,
    pub count: usize,
    pub mean_amount: Option<f64>,
    pub median_amount: Option<f64>,
}

// Per-class descriptive statistics for the report panel. Both classes are
// always present, with sentinels when a class has no records.
pub fn class_summary(view: &[&Transaction]) -> Vec<ClassSummary> {
    [false, true]
        .iter()
        .map(|&is_fraud| {
            let mut amounts: Vec<f64> = view
                .iter()
                .filter(|tx| tx.is_fraud == is_fraud)
                .map(|tx| tx.amount)
                .collect();
            amounts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let count = amounts.len();
            let mean_amount = if count > 0 {
                Some(amounts.iter().sum::<f64>() / count as f64)
            } else {
                None
            };
            ClassSummary {
                label: if is_fraud { "fraud" } else { "legit" }.to_string(),
                count,
                mean_amount,
                median_amount: median(&amounts),
            }
        })
        .collect()
}

// Median of an already-sorted slice.
fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}
