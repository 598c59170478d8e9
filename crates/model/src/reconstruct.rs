//! Posterior components in original units and the counterfactual series.

use cfact_sampler::Trace;

use crate::error::ModelError;
use crate::fourier::HarmonicBasis;
use crate::frame::RegressionFrame;
use crate::model::{BETA_TREND, BETA_YEARLY, INTERCEPT, REQUIRED_PARAMS, SLOPE};

/// Optional physical limits applied to the counterfactual.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueBounds {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl ValueBounds {
    /// No clamping.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Clamps every finite value into the bounds; `NaN` stays `NaN`.
    pub fn apply(&self, values: &mut [f64]) {
        for v in values.iter_mut().filter(|v| !v.is_nan()) {
            if let Some(lo) = self.lower {
                *v = v.max(lo);
            }
            if let Some(hi) = self.upper {
                *v = v.min(hi);
            }
        }
    }
}

/// A regression frame extended with posterior-mean components in original
/// units and the counterfactual.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    frame: RegressionFrame,
    trend: Vec<f64>,
    seasonal: Vec<f64>,
    seasonal_trend: Vec<f64>,
    posterior: Vec<f64>,
    cfact: Vec<f64>,
}

impl Reconstruction {
    /// Averages the trace's components over draws and removes the change in
    /// `trend + seasonal_trend` since the first time step from the response.
    ///
    /// Every component is linear in the coefficients and unscaling is
    /// affine, so the mean over draws equals the component evaluated at the
    /// posterior-mean coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleTrace`] if the trace is empty, lacks
    /// a parameter, or its coefficient widths differ from the basis, and
    /// [`ModelError::LengthMismatch`] if basis and frame disagree.
    pub fn new(
        trace: &Trace,
        basis: &HarmonicBasis,
        frame: RegressionFrame,
    ) -> Result<Self, ModelError> {
        let incompatible = |reason: String| ModelError::IncompatibleTrace { reason };
        if trace.is_empty() {
            return Err(incompatible("trace has no draws".to_string()));
        }
        trace
            .require(&REQUIRED_PARAMS)
            .map_err(|e| incompatible(e.to_string()))?;
        if basis.len() != frame.len() {
            return Err(ModelError::LengthMismatch {
                name: "basis",
                expected: frame.len(),
                got: basis.len(),
            });
        }

        let mean_of = |name: &str| {
            trace
                .param_mean(name)
                .ok_or_else(|| incompatible(format!("no draws for '{name}'")))
        };
        let intercept = mean_of(INTERCEPT)?[0];
        let slope = mean_of(SLOPE)?[0];
        let beta_yearly = mean_of(BETA_YEARLY)?;
        let beta_trend = mean_of(BETA_TREND)?;
        for (name, beta) in [(BETA_YEARLY, &beta_yearly), (BETA_TREND, &beta_trend)] {
            if beta.len() != basis.width() {
                return Err(incompatible(format!(
                    "'{name}' has {} entries, basis has {} columns",
                    beta.len(),
                    basis.width()
                )));
            }
        }

        let range = frame.y_range();
        let r = range.range();
        let g = frame.gmt_scaled();
        let year = basis.dot(&beta_yearly);
        let year_trend = basis.dot(&beta_trend);
        let trend_scaled: Vec<f64> = g.iter().map(|gi| intercept + slope * gi).collect();

        let trend = range.unscale_all(&trend_scaled);
        let seasonal: Vec<f64> = year.iter().map(|v| v * r).collect();
        let seasonal_trend: Vec<f64> = year_trend.iter().map(|v| v * r).collect();
        let posterior: Vec<f64> = (0..frame.len())
            .map(|i| range.unscale(trend_scaled[i] + year[i] + year_trend[i]))
            .collect();

        let forced: Vec<f64> = trend
            .iter()
            .zip(&seasonal_trend)
            .map(|(a, b)| a + b)
            .collect();
        // A frame always holds at least two rows.
        let anchor = forced[0];
        let cfact: Vec<f64> = frame
            .y()
            .iter()
            .zip(&forced)
            .map(|(y, f)| y - (f - anchor))
            .collect();

        Ok(Self {
            frame,
            trend,
            seasonal,
            seasonal_trend,
            posterior,
            cfact,
        })
    }

    /// Clamps the counterfactual into `bounds`.
    pub fn with_bounds(mut self, bounds: &ValueBounds) -> Self {
        bounds.apply(&mut self.cfact);
        self
    }

    pub fn frame(&self) -> &RegressionFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// `intercept + slope * g`, in original units.
    pub fn trend(&self) -> &[f64] {
        &self.trend
    }

    /// Yearly cycle, in original units around zero.
    pub fn seasonal(&self) -> &[f64] {
        &self.seasonal
    }

    /// Cycle fitted by `beta_trend`, in original units around zero.
    pub fn seasonal_trend(&self) -> &[f64] {
        &self.seasonal_trend
    }

    /// Full posterior-mean reconstruction of the response.
    pub fn posterior(&self) -> &[f64] {
        &self.posterior
    }

    /// Response with the regressor-driven change removed.
    pub fn cfact(&self) -> &[f64] {
        &self.cfact
    }
}
