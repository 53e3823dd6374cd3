use std::collections::BTreeMap;

use ndarray::Array1;
use serde::Serialize;
use tracing::debug;

use crate::csv_reader::Transaction;
use crate::filter::Measure;

pub const DEFAULT_GRID_SIZE: usize = 1000;

// Discretized, area-normalized continuous density estimate over [0, upper].
// The trapezoidal integral of an emitted curve is 1 within numerical tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub xs: Vec<f64>,
    pub densities: Vec<f64>,
}

// Scott's rule, matching scipy's gaussian_kde default: h = sigma * n^(-1/5)
// with the sample standard deviation. Returns None for fewer than two
// observations or a zero-variance sample.
fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let bandwidth = variance.sqrt() * n.powf(-0.2);
    (bandwidth.is_finite() && bandwidth > 0.0).then_some(bandwidth)
}

fn trapezoid(xs: &Array1<f64>, ys: &Array1<f64>) -> f64 {
    let mut area = 0.0;
    for i in 1..xs.len() {
        area += 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
    }
    area
}

// Gaussian KDE evaluated on the grid, renormalized by its trapezoidal
// integral. The raw kernel estimate's mass extends past the support bound, so
// the truncated curve must be rescaled to integrate to 1. Returns None when
// the sample is degenerate or no mass falls inside the support.
fn kde_curve(values: &[f64], xs: &Array1<f64>) -> Option<DensityCurve> {
    let bandwidth = scott_bandwidth(values)?;
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let mut densities = Array1::<f64>::zeros(xs.len());
    for (i, &x) in xs.iter().enumerate() {
        let mut total = 0.0;
        for &v in values {
            let z = (x - v) / bandwidth;
            total += (-0.5 * z * z).exp();
        }
        densities[i] = total * norm;
    }

    let area = trapezoid(xs, &densities);
    if !area.is_finite() || area <= 0.0 {
        return None;
    }
    densities.mapv_inplace(|d| d / area);
    Some(DensityCurve {
        xs: xs.to_vec(),
        densities: densities.to_vec(),
    })
}

/// Per-class density curves over `[0, upper]`. Classes with fewer than two
/// usable observations (or a degenerate sample) are omitted from the map
/// rather than reported as a zero curve.
pub fn estimate_density(
    view: &[&Transaction],
    measure: Measure,
    upper: f64,
    grid_size: usize,
) -> BTreeMap<String, DensityCurve> {
    let mut samples: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
    for tx in view {
        let value = measure.value(tx);
        if value.is_finite() {
            samples.entry(tx.class_label()).or_default().push(value);
        }
    }

    let xs = Array1::linspace(0.0, upper, grid_size.max(2));
    let mut curves = BTreeMap::new();
    for (label, values) in samples {
        match kde_curve(&values, &xs) {
            Some(curve) => {
                curves.insert(label.to_string(), curve);
            }
            None => debug!(label, observations = values.len(), "density omitted"),
        }
    }
    curves
}
