//! Min-max scaling of a series by the range of a reference series.

use crate::error::StatsError;

/// Finite range of a reference series.
///
/// Built with [`MinMax::of`], which rejects references that have no finite
/// value or whose range is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    /// Takes the range of `reference`, ignoring non-finite entries.
    ///
    /// # Errors
    ///
    /// - [`StatsError::NoFiniteValues`] if `reference` holds no finite value.
    /// - [`StatsError::ConstantReference`] if `min == max`.
    pub fn of(reference: &[f64]) -> Result<Self, StatsError> {
        let (min, max) = reference
            .iter()
            .filter(|x| x.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        if !min.is_finite() {
            return Err(StatsError::NoFiniteValues);
        }
        if max == min {
            return Err(StatsError::ConstantReference { value: min });
        }
        Ok(Self { min, max })
    }

    /// Smallest finite reference value.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest finite reference value.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// `max - min`, always strictly positive.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Maps `x` onto the unit interval of the reference range.
    #[inline]
    pub fn scale(&self, x: f64) -> f64 {
        (x - self.min) / self.range()
    }

    /// Inverse of [`MinMax::scale`].
    #[inline]
    pub fn unscale(&self, x: f64) -> f64 {
        x * self.range() + self.min
    }

    /// Scales every element of `xs`.
    pub fn scale_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.scale(x)).collect()
    }

    /// Unscales every element of `xs`.
    pub fn unscale_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.unscale(x)).collect()
    }
}

/// `(x - min(reference)) / (max(reference) - min(reference))`, elementwise.
///
/// # Errors
///
/// See [`MinMax::of`].
pub fn scale(x: &[f64], reference: &[f64]) -> Result<Vec<f64>, StatsError> {
    Ok(MinMax::of(reference)?.scale_all(x))
}

/// `x * (max(reference) - min(reference)) + min(reference)`, elementwise.
///
/// # Errors
///
/// See [`MinMax::of`].
pub fn unscale(x: &[f64], reference: &[f64]) -> Result<Vec<f64>, StatsError> {
    Ok(MinMax::of(reference)?.unscale_all(x))
}
