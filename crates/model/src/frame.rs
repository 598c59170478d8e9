//! Per-cell regression table: calendar, scaled time, response and regressor.

use cfact_stats::{MinMax, interp_uniform};
use chrono::NaiveDate;

use crate::error::ModelError;
use crate::time::TimeAxis;

/// Aligned per-cell table the model is fitted on.
///
/// Time and response are scaled by the cell's own range. The regressor is
/// interpolated from its own evenly spaced grid onto the cell's scaled time
/// and then scaled by its own range.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFrame {
    dates: Vec<NaiveDate>,
    t: Vec<f64>,
    y: Vec<f64>,
    y_scaled: Vec<f64>,
    gmt: Vec<f64>,
    gmt_scaled: Vec<f64>,
    y_range: MinMax,
    gmt_range: MinMax,
    span_days: i64,
}

/// Checks that a regressor series can be interpolated and scaled.
///
/// # Errors
///
/// Returns [`ModelError::InvalidRegressor`] if the series is empty, has a
/// missing value, or is constant.
pub fn check_regressor(gmt: &[f64]) -> Result<(), ModelError> {
    if gmt.is_empty() {
        return Err(ModelError::InvalidRegressor {
            reason: "series is empty".to_string(),
        });
    }
    if let Some(i) = gmt.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::InvalidRegressor {
            reason: format!("non-finite value at index {i}"),
        });
    }
    MinMax::of(gmt).map_err(|e| ModelError::InvalidRegressor {
        reason: e.to_string(),
    })?;
    Ok(())
}

impl RegressionFrame {
    /// Builds a frame from a time axis, the cell's response and the regressor.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidTime`] if the axis cannot be decoded, is not
    ///   sorted, or spans less than one day.
    /// - [`ModelError::LengthMismatch`] if the response and axis differ in length.
    /// - [`ModelError::Degenerate`] if the response is all missing or constant.
    /// - [`ModelError::InvalidRegressor`] if the regressor is unusable.
    pub fn build(time: &TimeAxis, y: &[f64], gmt: &[f64]) -> Result<Self, ModelError> {
        Self::from_dates(time.dates()?, y, gmt)
    }

    /// Same as [`RegressionFrame::build`] for already decoded dates.
    ///
    /// # Errors
    ///
    /// See [`RegressionFrame::build`].
    pub fn from_dates(dates: Vec<NaiveDate>, y: &[f64], gmt: &[f64]) -> Result<Self, ModelError> {
        if y.len() != dates.len() {
            return Err(ModelError::LengthMismatch {
                name: "response",
                expected: dates.len(),
                got: y.len(),
            });
        }
        if let Some(i) = dates.windows(2).position(|w| w[1] < w[0]) {
            return Err(ModelError::InvalidTime {
                reason: format!("dates not sorted at index {}", i + 1),
            });
        }
        let (first, last) = match (dates.first(), dates.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => {
                return Err(ModelError::InvalidTime {
                    reason: "time axis is empty".to_string(),
                });
            }
        };
        let span_days = (last - first).num_days();
        if span_days < 1 {
            return Err(ModelError::InvalidTime {
                reason: "time axis spans less than one day".to_string(),
            });
        }

        if y.iter().all(|v| !v.is_finite()) {
            return Err(ModelError::Degenerate {
                reason: "all values missing".to_string(),
            });
        }
        let y_range = MinMax::of(y)?;
        check_regressor(gmt)?;

        let span = span_days as f64;
        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - first).num_days() as f64 / span)
            .collect();

        let gmt_on_days = interp_uniform(&t, gmt).map_err(|e| ModelError::InvalidRegressor {
            reason: e.to_string(),
        })?;
        let gmt_range = MinMax::of(&gmt_on_days).map_err(|e| ModelError::InvalidRegressor {
            reason: format!("after interpolation: {e}"),
        })?;

        // Non-finite observations become NaN so they are skipped downstream.
        let y: Vec<f64> = y
            .iter()
            .map(|&v| if v.is_finite() { v } else { f64::NAN })
            .collect();

        Ok(Self {
            y_scaled: y_range.scale_all(&y),
            gmt_scaled: gmt_range.scale_all(&gmt_on_days),
            dates,
            t,
            y,
            gmt: gmt_on_days,
            y_range,
            gmt_range,
            span_days,
        })
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of non-missing observations.
    pub fn n_observed(&self) -> usize {
        self.y.iter().filter(|v| v.is_finite()).count()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Scaled time in `[0, 1]`.
    pub fn t(&self) -> &[f64] {
        &self.t
    }

    /// Raw response, missing values as `NaN`.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn y_scaled(&self) -> &[f64] {
        &self.y_scaled
    }

    /// Regressor on the cell's calendar.
    pub fn gmt(&self) -> &[f64] {
        &self.gmt
    }

    pub fn gmt_scaled(&self) -> &[f64] {
        &self.gmt_scaled
    }

    /// Range used to scale the response.
    pub fn y_range(&self) -> MinMax {
        self.y_range
    }

    pub fn gmt_range(&self) -> MinMax {
        self.gmt_range
    }

    /// Days between the first and last date.
    pub fn span_days(&self) -> i64 {
        self.span_days
    }
}
