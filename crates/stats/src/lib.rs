//! # cfact-stats
//!
//! Numeric helpers shared by the cfact crates: summary statistics, min-max
//! scaling of a series by its own range, and piecewise-linear interpolation.
//!
//! Missing values are represented as `NaN` throughout. The scaling helpers
//! ignore them when computing a range and carry them through unchanged.

mod error;
mod interp;
mod scale;

pub use error::StatsError;
pub use interp::{interp_linear, interp_uniform, linspace};
pub use scale::{MinMax, scale, unscale};

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample variance with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Mean over the finite entries of `data`, or `None` if there are none.
pub fn nan_mean(data: &[f64]) -> Option<f64> {
    let (sum, n) = data
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), &x| (s + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean absolute difference between two series over positions where both
/// are finite. Returns `None` when no such position exists.
pub fn mean_abs_diff(a: &[f64], b: &[f64]) -> Option<f64> {
    let diffs: Vec<f64> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (x - y).abs())
        .collect();
    nan_mean(&diffs)
}
