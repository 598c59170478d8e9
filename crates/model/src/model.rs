//! The additive seasonal-plus-trend regression as a log density.

use statrs::distribution::{Cauchy, Continuous, Normal};
use tracing::debug;

use cfact_sampler::{LogDensity, ParamBlock};

use crate::config::ModelConfig;
use crate::design::SufficientStats;
use crate::error::ModelError;
use crate::fourier::HarmonicBasis;
use crate::frame::RegressionFrame;

pub const INTERCEPT: &str = "intercept";
pub const SLOPE: &str = "slope";
pub const SIGMA: &str = "sigma";
pub const BETA_YEARLY: &str = "beta_yearly";
pub const BETA_TREND: &str = "beta_trend";

/// Every parameter a usable trace must contain.
pub const REQUIRED_PARAMS: [&str; 5] = [INTERCEPT, SLOPE, SIGMA, BETA_YEARLY, BETA_TREND];

/// Harmonic regression of the scaled response on the scaled regressor `g`:
///
/// ```text
/// intercept, slope ~ Normal(linear_mu, linear_sigma)
/// sigma            ~ HalfCauchy(sigma_beta)
/// beta_yearly      ~ Normal(smu, sps)
/// beta_trend       ~ Normal(stmu, stps)
/// mu = intercept + slope * g + X · beta_yearly + g * (X · beta_trend)
/// y  ~ Normal(mu, sigma)
/// ```
///
/// The sampler sees `[intercept, slope, ln sigma, beta_yearly, beta_trend]`.
#[derive(Debug, Clone)]
pub struct DetrendModel {
    config: ModelConfig,
    basis: HarmonicBasis,
    stats: SufficientStats,
    blocks: Vec<ParamBlock>,
    linear_prior: Normal,
    yearly_prior: Normal,
    trend_prior: Normal,
    sigma_prior: Cauchy,
}

impl DetrendModel {
    /// Builds the model for one frame.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidConfig`] if `config` does not validate.
    /// - [`ModelError::Degenerate`] if the frame has fewer observations
    ///   than coefficients.
    pub fn new(frame: &RegressionFrame, config: &ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let basis = HarmonicBasis::yearly(frame.t(), frame.span_days(), config.modes());
        let stats = SufficientStats::build(frame, &basis);
        if stats.n() <= stats.width() {
            return Err(ModelError::Degenerate {
                reason: format!(
                    "{} observations for {} coefficients",
                    stats.n(),
                    stats.width()
                ),
            });
        }

        let width = config.basis_width();
        let blocks = vec![
            ParamBlock::scalar(INTERCEPT),
            ParamBlock::scalar(SLOPE),
            ParamBlock::positive(SIGMA),
            ParamBlock::vector(BETA_YEARLY, width),
            ParamBlock::vector(BETA_TREND, width),
        ];

        let prior_err = |e: &dyn std::fmt::Display| ModelError::InvalidConfig {
            reason: e.to_string(),
        };
        let linear_prior =
            Normal::new(config.linear_mu(), config.linear_sigma()).map_err(|e| prior_err(&e))?;
        let yearly_prior = Normal::new(config.smu(), config.sps()).map_err(|e| prior_err(&e))?;
        let trend_prior = Normal::new(config.stmu(), config.stps()).map_err(|e| prior_err(&e))?;
        let sigma_prior = Cauchy::new(0.0, config.sigma_beta()).map_err(|e| prior_err(&e))?;

        debug!(
            n_obs = stats.n(),
            n_coef = stats.width(),
            period = basis.period(),
            "model built"
        );

        Ok(Self {
            config: config.clone(),
            basis,
            stats,
            blocks,
            linear_prior,
            yearly_prior,
            trend_prior,
            sigma_prior,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Harmonic basis shared by the yearly and trend terms.
    pub fn basis(&self) -> &HarmonicBasis {
        &self.basis
    }

    /// Number of observations entering the likelihood.
    pub fn n_observed(&self) -> usize {
        self.stats.n()
    }

    /// Regression coefficients of an unconstrained position (drops `ln sigma`).
    fn coefficients(theta: &[f64]) -> Vec<f64> {
        let mut w = Vec::with_capacity(theta.len() - 1);
        w.extend_from_slice(&theta[..2]);
        w.extend_from_slice(&theta[3..]);
        w
    }
}

impl LogDensity for DetrendModel {
    fn blocks(&self) -> &[ParamBlock] {
        &self.blocks
    }

    fn log_density(&self, theta: &[f64]) -> f64 {
        let width = self.config.basis_width();
        let ln_sigma = theta[2];
        let sigma = ln_sigma.exp();
        if !(sigma > 0.0 && sigma.is_finite()) {
            return f64::NEG_INFINITY;
        }

        let mut lp = self.linear_prior.ln_pdf(theta[0]) + self.linear_prior.ln_pdf(theta[1]);
        // Half-Cauchy density is twice the Cauchy density on sigma > 0; the
        // trailing ln_sigma is the Jacobian of sampling on the log scale.
        lp += std::f64::consts::LN_2 + self.sigma_prior.ln_pdf(sigma) + ln_sigma;
        let (yearly, trend) = theta[3..].split_at(width);
        lp += yearly.iter().map(|&b| self.yearly_prior.ln_pdf(b)).sum::<f64>();
        lp += trend.iter().map(|&b| self.trend_prior.ln_pdf(b)).sum::<f64>();

        let ssr = self.stats.ssr(&Self::coefficients(theta));
        let n = self.stats.n() as f64;
        lp += -n * ln_sigma - ssr / (2.0 * sigma * sigma);

        if lp.is_nan() { f64::NEG_INFINITY } else { lp }
    }

    fn initial_point(&self) -> Vec<f64> {
        let width = self.config.basis_width();
        let mut p = vec![self.config.linear_mu(), self.config.linear_mu(), 0.0];
        p.extend(std::iter::repeat_n(self.config.smu(), width));
        p.extend(std::iter::repeat_n(self.config.stmu(), width));
        p
    }

    fn point_estimate(&self) -> Option<Vec<f64>> {
        let w = self.stats.least_squares()?;
        let resid_sd = (self.stats.ssr(&w) / self.stats.n() as f64).sqrt().max(1e-6);
        let mut p = Vec::with_capacity(w.len() + 1);
        p.extend_from_slice(&w[..2]);
        p.push(resid_sd.ln());
        p.extend_from_slice(&w[2..]);
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeDelta};

    fn frame(n: i64) -> RegressionFrame {
        let start = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..n).map(|i| start + TimeDelta::days(i)).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                5.0 + 2.0 * t + (2.0 * std::f64::consts::PI * i as f64 / 365.25).cos()
            })
            .collect();
        RegressionFrame::from_dates(dates, &y, &[0.0, 1.0]).unwrap()
    }

    #[test]
    fn layout_has_required_blocks() {
        let m = DetrendModel::new(&frame(730), &ModelConfig::new().with_modes(2)).unwrap();
        let names: Vec<&str> = m.blocks().iter().map(|b| b.name()).collect();
        assert_eq!(names, REQUIRED_PARAMS.to_vec());
        assert_eq!(m.dim(), 3 + 2 * 4);
        assert_eq!(m.initial_point().len(), m.dim());
    }

    #[test]
    fn invalid_config_is_fatal() {
        let err = DetrendModel::new(&frame(100), &ModelConfig::new().with_modes(0)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn too_few_observations_is_degenerate() {
        let err = DetrendModel::new(&frame(10), &ModelConfig::new().with_modes(3)).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn density_finite_at_start_points() {
        let m = DetrendModel::new(&frame(730), &ModelConfig::new()).unwrap();
        assert!(m.log_density(&m.initial_point()).is_finite());
        let est = m.point_estimate().unwrap();
        assert!(m.log_density(&est).is_finite());
        assert!(m.log_density(&est) > m.log_density(&m.initial_point()));
    }

    #[test]
    fn point_estimate_recovers_linear_trend() {
        let m = DetrendModel::new(&frame(730), &ModelConfig::new().with_modes(1)).unwrap();
        let est = m.point_estimate().unwrap();
        // y ranges over roughly [4, 8]; slope in scaled units is 2 / range.
        let f = frame(730);
        let expected_slope = 2.0 / f.y_range().range();
        assert_relative_eq!(est[1], expected_slope, epsilon = 0.05);
    }

    #[test]
    fn density_decreases_away_from_mode() {
        let m = DetrendModel::new(&frame(730), &ModelConfig::new()).unwrap();
        let est = m.point_estimate().unwrap();
        let mut off = est.clone();
        off[1] += 0.5;
        assert!(m.log_density(&off) < m.log_density(&est));
    }
}
