//! Model hyperparameters.

use crate::error::ModelError;

/// Highest harmonic still resolvable with daily sampling (half the days of a
/// year).
pub const MAX_MODES: usize = 182;

/// Priors and basis size for [`DetrendModel`](crate::DetrendModel).
///
/// All priors act on the min-max scaled response, so their scales are
/// relative to a unit range.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Cosine/sine pairs in each harmonic basis.
    modes: usize,
    /// Prior mean of intercept and slope.
    linear_mu: f64,
    /// Prior standard deviation of intercept and slope.
    linear_sigma: f64,
    /// Half-Cauchy scale of the noise prior.
    sigma_beta: f64,
    /// Prior mean of the yearly coefficients.
    smu: f64,
    /// Prior standard deviation of the yearly coefficients.
    sps: f64,
    /// Prior mean of the trend-interaction coefficients.
    stmu: f64,
    /// Prior standard deviation of the trend-interaction coefficients.
    stps: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelConfig {
    /// Default model configuration.
    ///
    /// - `modes`: 3
    /// - `linear_mu`: 0.5, `linear_sigma`: 5.0
    /// - `sigma_beta`: 0.5
    /// - `smu`: 0.0, `sps`: 2.0
    /// - `stmu`: 0.0, `stps`: 2.0
    pub fn new() -> Self {
        Self {
            modes: 3,
            linear_mu: 0.5,
            linear_sigma: 5.0,
            sigma_beta: 0.5,
            smu: 0.0,
            sps: 2.0,
            stmu: 0.0,
            stps: 2.0,
        }
    }

    pub fn with_modes(mut self, modes: usize) -> Self {
        self.modes = modes;
        self
    }

    /// Sets the Normal prior shared by intercept and slope.
    pub fn with_linear_prior(mut self, mu: f64, sigma: f64) -> Self {
        self.linear_mu = mu;
        self.linear_sigma = sigma;
        self
    }

    pub fn with_sigma_beta(mut self, beta: f64) -> Self {
        self.sigma_beta = beta;
        self
    }

    /// Sets the Normal prior of the yearly coefficients.
    pub fn with_yearly_prior(mut self, mu: f64, sd: f64) -> Self {
        self.smu = mu;
        self.sps = sd;
        self
    }

    /// Sets the Normal prior of the trend-interaction coefficients.
    pub fn with_trend_prior(mut self, mu: f64, sd: f64) -> Self {
        self.stmu = mu;
        self.stps = sd;
        self
    }

    pub fn modes(&self) -> usize {
        self.modes
    }

    pub fn linear_mu(&self) -> f64 {
        self.linear_mu
    }

    pub fn linear_sigma(&self) -> f64 {
        self.linear_sigma
    }

    pub fn sigma_beta(&self) -> f64 {
        self.sigma_beta
    }

    pub fn smu(&self) -> f64 {
        self.smu
    }

    pub fn sps(&self) -> f64 {
        self.sps
    }

    pub fn stmu(&self) -> f64 {
        self.stmu
    }

    pub fn stps(&self) -> f64 {
        self.stps
    }

    /// Width of one harmonic basis (`2 * modes`).
    pub fn basis_width(&self) -> usize {
        2 * self.modes
    }

    /// Validates the mode count and every prior.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ModelError> {
        let fail = |reason: String| Err(ModelError::InvalidConfig { reason });
        if self.modes == 0 || self.modes > MAX_MODES {
            return fail(format!(
                "modes must be in 1..={MAX_MODES}, got {}",
                self.modes
            ));
        }
        for (name, v) in [
            ("linear_mu", self.linear_mu),
            ("smu", self.smu),
            ("stmu", self.stmu),
        ] {
            if !v.is_finite() {
                return fail(format!("{name} must be finite, got {v}"));
            }
        }
        for (name, v) in [
            ("linear_sigma", self.linear_sigma),
            ("sigma_beta", self.sigma_beta),
            ("sps", self.sps),
            ("stps", self.stps),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return fail(format!("{name} must be positive, got {v}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = ModelConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.modes(), 3);
        assert_eq!(cfg.basis_width(), 6);
    }

    #[test]
    fn zero_modes_is_fatal() {
        let err = ModelConfig::new().with_modes(0).validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("modes"));
    }

    #[test]
    fn too_many_modes_rejected() {
        assert!(
            ModelConfig::new()
                .with_modes(MAX_MODES + 1)
                .validate()
                .is_err()
        );
        assert!(ModelConfig::new().with_modes(MAX_MODES).validate().is_ok());
    }

    #[test]
    fn non_positive_scales_rejected() {
        assert!(
            ModelConfig::new()
                .with_linear_prior(0.0, 0.0)
                .validate()
                .is_err()
        );
        assert!(ModelConfig::new().with_sigma_beta(-1.0).validate().is_err());
        assert!(
            ModelConfig::new()
                .with_trend_prior(0.0, f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn non_finite_mean_rejected() {
        let err = ModelConfig::new()
            .with_yearly_prior(f64::INFINITY, 1.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("smu"));
    }
}
