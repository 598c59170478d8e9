//! Piecewise-linear interpolation.

use crate::error::StatsError;

/// `n` evenly spaced points from `start` to `end` inclusive.
///
/// Returns an empty vector for `n == 0` and `[start]` for `n == 1`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Linear interpolation of the samples `(xp, fp)` at each point of `x`.
///
/// `xp` must be non-decreasing. Points left of `xp[0]` take `fp[0]` and points
/// right of the last knot take the last value. `NaN` inputs yield `NaN`.
///
/// # Errors
///
/// - [`StatsError::Empty`] if `xp` is empty.
/// - [`StatsError::LengthMismatch`] if `xp` and `fp` differ in length.
pub fn interp_linear(x: &[f64], xp: &[f64], fp: &[f64]) -> Result<Vec<f64>, StatsError> {
    if xp.is_empty() {
        return Err(StatsError::Empty { name: "xp" });
    }
    if xp.len() != fp.len() {
        return Err(StatsError::LengthMismatch {
            expected: xp.len(),
            got: fp.len(),
        });
    }

    let last = xp.len() - 1;
    let out = x
        .iter()
        .map(|&xi| {
            if xi.is_nan() {
                return f64::NAN;
            }
            if xi <= xp[0] {
                return fp[0];
            }
            if xi >= xp[last] {
                return fp[last];
            }
            // First knot strictly greater than xi; xp[hi - 1] <= xi < xp[hi].
            let hi = xp.partition_point(|&k| k <= xi);
            let lo = hi - 1;
            let dx = xp[hi] - xp[lo];
            if dx == 0.0 {
                return fp[hi];
            }
            fp[lo] + (fp[hi] - fp[lo]) * (xi - xp[lo]) / dx
        })
        .collect();
    Ok(out)
}

/// Interpolates `fp`, taken to be evenly spaced over `[0, 1]`, at each `x`.
///
/// # Errors
///
/// [`StatsError::Empty`] if `fp` is empty.
pub fn interp_uniform(x: &[f64], fp: &[f64]) -> Result<Vec<f64>, StatsError> {
    let xp = linspace(0.0, 1.0, fp.len());
    interp_linear(x, &xp, fp)
}
