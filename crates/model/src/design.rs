//! Sufficient statistics of the linear-Gaussian likelihood.
//!
//! With coefficients `w = [intercept, slope, beta_yearly, beta_trend]` the
//! mean is `D w` for the design row
//!
//! ```text
//! d_t = [1, g_t, X_t, g_t * X_t]
//! ```
//!
//! so the residual sum of squares only needs `DᵀD`, `Dᵀy` and `yᵀy` over the
//! observed rows.

use ndarray::Array2;

use crate::fourier::HarmonicBasis;
use crate::frame::RegressionFrame;
use crate::linalg::solve_spd;

/// Relative ridge applied when solving the normal equations.
const LSQ_RIDGE: f64 = 1e-10;

#[derive(Debug, Clone)]
pub(crate) struct SufficientStats {
    xtx: Array2<f64>,
    xty: Vec<f64>,
    yty: f64,
    n: usize,
}

impl SufficientStats {
    /// Accumulates the statistics over rows with a finite scaled response.
    pub(crate) fn build(frame: &RegressionFrame, basis: &HarmonicBasis) -> Self {
        let width = basis.width();
        let k = 2 + 2 * width;
        let mut xtx = Array2::<f64>::zeros((k, k));
        let mut xty = vec![0.0; k];
        let mut yty = 0.0;
        let mut n = 0;
        let mut d = vec![0.0; k];

        for (i, (&y, &g)) in frame.y_scaled().iter().zip(frame.gmt_scaled()).enumerate() {
            if !y.is_finite() {
                continue;
            }
            d[0] = 1.0;
            d[1] = g;
            for (j, &x) in basis.row(i).iter().enumerate() {
                d[2 + j] = x;
                d[2 + width + j] = g * x;
            }
            for a in 0..k {
                xty[a] += d[a] * y;
                for b in a..k {
                    xtx[[a, b]] += d[a] * d[b];
                }
            }
            yty += y * y;
            n += 1;
        }
        for a in 0..k {
            for b in 0..a {
                xtx[[a, b]] = xtx[[b, a]];
            }
        }

        Self { xtx, xty, yty, n }
    }

    /// Number of coefficients.
    pub(crate) fn width(&self) -> usize {
        self.xty.len()
    }

    /// Number of observed rows.
    pub(crate) fn n(&self) -> usize {
        self.n
    }

    /// `‖y - D w‖²`, clamped at zero against rounding.
    pub(crate) fn ssr(&self, w: &[f64]) -> f64 {
        let k = self.width();
        let mut quad = 0.0;
        let mut lin = 0.0;
        for a in 0..k {
            lin += w[a] * self.xty[a];
            let mut row = 0.0;
            for b in 0..k {
                row += self.xtx[[a, b]] * w[b];
            }
            quad += w[a] * row;
        }
        (self.yty - 2.0 * lin + quad).max(0.0)
    }

    /// Ordinary least-squares coefficients, if the system can be solved.
    pub(crate) fn least_squares(&self) -> Option<Vec<f64>> {
        solve_spd(&self.xtx, &self.xty, LSQ_RIDGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeDelta};

    fn frame_and_basis(modes: usize) -> (RegressionFrame, HarmonicBasis) {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..400).map(|i| start + TimeDelta::days(i)).collect();
        let y: Vec<f64> = (0..400)
            .map(|i| {
                let t = i as f64 / 399.0;
                if i % 37 == 0 {
                    f64::NAN
                } else {
                    2.0 + t + 0.3 * (2.0 * std::f64::consts::PI * i as f64 / 365.25).sin()
                }
            })
            .collect();
        let frame = RegressionFrame::from_dates(dates, &y, &[0.0, 0.4, 1.0]).unwrap();
        let basis = HarmonicBasis::yearly(frame.t(), frame.span_days(), modes);
        (frame, basis)
    }

    fn direct_ssr(frame: &RegressionFrame, basis: &HarmonicBasis, w: &[f64]) -> f64 {
        let width = basis.width();
        let mut ssr = 0.0;
        for i in 0..frame.len() {
            let y = frame.y_scaled()[i];
            if !y.is_finite() {
                continue;
            }
            let g = frame.gmt_scaled()[i];
            let row = basis.row(i);
            let mut mu = w[0] + w[1] * g;
            for j in 0..width {
                mu += row[j] * w[2 + j] + g * row[j] * w[2 + width + j];
            }
            ssr += (y - mu).powi(2);
        }
        ssr
    }

    #[test]
    fn ssr_matches_direct_sum() {
        let (frame, basis) = frame_and_basis(2);
        let stats = SufficientStats::build(&frame, &basis);
        assert_eq!(stats.width(), 2 + 4 * 2);
        assert_eq!(stats.n(), frame.n_observed());
        let w: Vec<f64> = (0..stats.width()).map(|i| 0.1 * i as f64 - 0.3).collect();
        assert_relative_eq!(stats.ssr(&w), direct_ssr(&frame, &basis, &w), epsilon = 1e-8);
    }

    #[test]
    fn least_squares_minimises_ssr() {
        let (frame, basis) = frame_and_basis(1);
        let stats = SufficientStats::build(&frame, &basis);
        let w = stats.least_squares().unwrap();
        let best = stats.ssr(&w);
        for i in 0..w.len() {
            let mut nudged = w.clone();
            nudged[i] += 1e-3;
            assert!(stats.ssr(&nudged) >= best);
        }
    }
}
