use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::csv_reader::Transaction;
use crate::regions;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoStat {
    pub region: String,
    /// Display name from the static lookup; unmatched codes pass through as-is.
    pub display_name: String,
    pub count: usize,
    pub positives: usize,
    pub rate: Option<f64>,
    pub total_amount: f64,
    pub mean_amount: Option<f64>,
    /// Centroid of the observed records, not the lookup's canonical point.
    pub centroid_lat: f64,
    pub centroid_lon: f64,
}

#[derive(Debug, Default)]
struct RegionAccumulator {
    count: usize,
    positives: usize,
    amount: f64,
    lat_sum: f64,
    lon_sum: f64,
}

/// Per-region statistics over the view, ranked by descending fraud rate
/// (ties broken by region code so output is deterministic).
pub fn aggregate_by_region(view: &[&Transaction]) -> Vec<GeoStat> {
    let mut groups: HashMap<String, RegionAccumulator> = HashMap::new();
    for tx in view {
        let acc = groups.entry(tx.state.clone()).or_default();
        acc.count += 1;
        if tx.is_fraud {
            acc.positives += 1;
        }
        acc.amount += tx.amount;
        acc.lat_sum += tx.latitude;
        acc.lon_sum += tx.longitude;
    }

    let mut stats: Vec<GeoStat> = groups
        .into_iter()
        .map(|(region, acc)| {
            let n = acc.count as f64;
            let display_name = regions::lookup(&region)
                .map(|info| info.name.to_string())
                .unwrap_or_else(|| region.clone());
            GeoStat {
                display_name,
                count: acc.count,
                positives: acc.positives,
                rate: (acc.count > 0).then(|| acc.positives as f64 / n),
                total_amount: acc.amount,
                mean_amount: (acc.count > 0).then(|| acc.amount / n),
                centroid_lat: acc.lat_sum / n,
                centroid_lon: acc.lon_sum / n,
                region,
            }
        })
        .collect();

    stats.sort_by(|a, b| match (a.rate, b.rate) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.region.cmp(&b.region),
    });
    stats
}

/// Concentration index: population coefficient of variation of the per-region
/// positive counts. Undefined for fewer than two regions or a zero mean.
pub fn concentration_index(stats: &[GeoStat]) -> Option<f64> {
    if stats.len() < 2 {
        return None;
    }
    let counts: Vec<f64> = stats.iter().map(|s| s.positives as f64).collect();
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}
