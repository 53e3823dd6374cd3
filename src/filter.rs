use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use crate::calendar;
use crate::csv_reader::Transaction;

/// Seed used for the record cap when a `FilterSpec` names no seed of its own.
/// Every call with the same spec and dataset is reproducible under it.
pub const DEFAULT_SAMPLE_SEED: u64 = 0x5EED;

// Continuous field an aggregation reads from a record. `LogAmount` produces a
// non-finite value for a zero amount; consumers skip non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measure {
    Amount,
    LogAmount,
}

impl Measure {
    pub fn value(&self, tx: &Transaction) -> f64 {
        match self {
            Measure::Amount => tx.amount,
            Measure::LogAmount => tx.amount.ln(),
        }
    }
}

// Observed amount range of the base dataset. Caller-supplied thresholds and
// range endpoints are clamped into it rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountBounds {
    pub min: f64,
    pub max: f64,
}

impl AmountBounds {
    pub fn from_dataset(dataset: &[Transaction]) -> Option<Self> {
        let mut bounds: Option<AmountBounds> = None;
        for tx in dataset {
            let b = bounds.get_or_insert(AmountBounds {
                min: tx.amount,
                max: tx.amount,
            });
            if tx.amount < b.min {
                b.min = tx.amount;
            }
            if tx.amount > b.max {
                b.max = tx.amount;
            }
        }
        bounds
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Conjunction of predicates selecting a subset of the dataset.
///
/// An empty membership set means "no constraint"; there is no separate
/// "all values" sentinel. A set that happens to name every observed value
/// behaves identically only for the dataset in hand. Predicates combine with
/// logical AND; an unsatisfiable combination yields an empty view, never an
/// error. The default spec matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    /// Inclusive lower bound on the amount. Swapped with `amount_max` when
    /// the two are reversed, then clamped to the observed bounds.
    pub amount_min: Option<f64>,
    /// Inclusive upper bound on the amount.
    pub amount_max: Option<f64>,
    /// Allowed merchant categories; empty = all.
    pub categories: Vec<String>,
    /// Allowed region codes; empty = all.
    pub regions: Vec<String>,
    /// Allowed day-of-week names; empty = all. A record without a parseable
    /// timestamp cannot satisfy a day constraint and is excluded.
    pub days: Vec<String>,
    /// Fraud-label selection; `None` keeps both classes.
    pub fraud_label: Option<bool>,
    /// Cap on the matched set; larger results are subsampled deterministically.
    pub sample_cap: Option<usize>,
    /// Seed for the subsample; `None` applies `DEFAULT_SAMPLE_SEED`.
    pub sample_seed: Option<u64>,
}

// Repairs a reversed range and clamps both endpoints to the observed bounds.
fn normalized_range(
    bounds: Option<AmountBounds>,
    spec: &FilterSpec,
) -> (Option<f64>, Option<f64>) {
    let (mut lo, mut hi) = (spec.amount_min, spec.amount_max);
    if let (Some(a), Some(b)) = (lo, hi) {
        if a > b {
            lo = Some(b);
            hi = Some(a);
        }
    }
    if let Some(bounds) = bounds {
        lo = lo.map(|v| bounds.clamp(v));
        hi = hi.map(|v| bounds.clamp(v));
    }
    (lo, hi)
}

fn matches(tx: &Transaction, spec: &FilterSpec, lo: Option<f64>, hi: Option<f64>) -> bool {
    if lo.is_some_and(|lo| tx.amount < lo) || hi.is_some_and(|hi| tx.amount > hi) {
        return false;
    }
    if !spec.categories.is_empty() && !spec.categories.iter().any(|c| c == &tx.category) {
        return false;
    }
    if !spec.regions.is_empty() && !spec.regions.iter().any(|r| r == &tx.state) {
        return false;
    }
    if !spec.days.is_empty() {
        let Some(timestamp) = tx.timestamp else {
            return false;
        };
        let day = calendar::day_name(timestamp);
        if !spec.days.iter().any(|d| d == day) {
            return false;
        }
    }
    if spec.fraud_label.is_some_and(|label| label != tx.is_fraud) {
        return false;
    }
    true
}

// Deterministic subsample that preserves dataset order.
fn subsample<'a>(matched: Vec<&'a Transaction>, cap: usize, seed: u64) -> Vec<&'a Transaction> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keep = rand::seq::index::sample(&mut rng, matched.len(), cap).into_vec();
    keep.sort_unstable();
    keep.into_iter().map(|i| matched[i]).collect()
}

/// Applies the spec to the base dataset and returns a fresh view. The base
/// dataset is never mutated and no state is carried between calls.
pub fn apply_filter<'a>(dataset: &'a [Transaction], spec: &FilterSpec) -> Vec<&'a Transaction> {
    let (lo, hi) = normalized_range(AmountBounds::from_dataset(dataset), spec);
    let mut matched: Vec<&Transaction> = dataset
        .iter()
        .filter(|tx| matches(tx, spec, lo, hi))
        .collect();

    if let Some(cap) = spec.sample_cap {
        if matched.len() > cap {
            let seed = spec.sample_seed.unwrap_or(DEFAULT_SAMPLE_SEED);
            matched = subsample(matched, cap, seed);
        }
    }

    debug!(matched = matched.len(), total = dataset.len(), "filter applied");
    matched
}
