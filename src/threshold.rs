use serde::Serialize;

use crate::csv_reader::Transaction;
use crate::filter::Measure;

// Classification metrics for a numeric cut point. Precision equals the rate
// by construction; it is kept as a separately named output because it answers
// a different analyst question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierMetrics {
    pub threshold: f64,
    pub count_above: usize,
    pub positive_above: usize,
    pub total_positive: usize,
    pub rate: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

/// Splits the view at `threshold` (strictly greater than; the boundary
/// itself counts as below) and computes the alert-quality ratios. Every
/// zero-denominator ratio is `None`, never an error and never a silent zero.
pub fn classify_threshold(
    view: &[&Transaction],
    measure: Measure,
    threshold: f64,
) -> ClassifierMetrics {
    let mut count_above = 0;
    let mut positive_above = 0;
    let mut total_positive = 0;
    for tx in view {
        if tx.is_fraud {
            total_positive += 1;
        }
        let value = measure.value(tx);
        if value.is_finite() && value > threshold {
            count_above += 1;
            if tx.is_fraud {
                positive_above += 1;
            }
        }
    }

    let ratio = |num: usize, den: usize| (den > 0).then(|| num as f64 / den as f64);
    ClassifierMetrics {
        threshold,
        count_above,
        positive_above,
        total_positive,
        rate: ratio(positive_above, count_above),
        precision: ratio(positive_above, count_above),
        recall: ratio(positive_above, total_positive),
    }
}
