//! Harmonic design matrices.

use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView2, s};

/// Days per year used to place one harmonic cycle per year on scaled time.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Period, in scaled-time units, of a yearly cycle over `span_days`.
pub fn yearly_period(span_days: f64) -> f64 {
    DAYS_PER_YEAR / span_days
}

/// `[cos(2πk t / p) | sin(2πk t / p)]` for `k = 1..=modes`.
///
/// Returns a `t.len() x 2 * modes` matrix whose first `modes` columns hold
/// the cosines and last `modes` columns the sines, in increasing frequency.
pub fn fourier_series(t: &[f64], period: f64, modes: usize) -> Array2<f64> {
    let mut x = Array2::<f64>::zeros((t.len(), 2 * modes));
    for (row, &ti) in t.iter().enumerate() {
        for k in 0..modes {
            let phase = 2.0 * PI * (k + 1) as f64 / period * ti;
            x[[row, k]] = phase.cos();
            x[[row, modes + k]] = phase.sin();
        }
    }
    x
}

/// A harmonic basis together with the period and mode count it was built
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicBasis {
    matrix: Array2<f64>,
    period: f64,
    modes: usize,
}

impl HarmonicBasis {
    pub fn new(t: &[f64], period: f64, modes: usize) -> Self {
        Self {
            matrix: fourier_series(t, period, modes),
            period,
            modes,
        }
    }

    /// Basis with one cycle per year over a series spanning `span_days`.
    pub fn yearly(t: &[f64], span_days: i64, modes: usize) -> Self {
        Self::new(t, yearly_period(span_days as f64), modes)
    }

    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn modes(&self) -> usize {
        self.modes
    }

    /// Number of columns (`2 * modes`).
    pub fn width(&self) -> usize {
        self.matrix.ncols()
    }

    /// Number of rows (time steps).
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    /// Row `i` of the basis.
    pub fn row(&self, i: usize) -> ndarray::ArrayView1<'_, f64> {
        self.matrix.row(i)
    }

    /// `X · beta` over all rows.
    ///
    /// # Panics
    ///
    /// Panics if `beta.len() != self.width()`.
    pub fn dot(&self, beta: &[f64]) -> Vec<f64> {
        let b = Array1::from(beta.to_vec());
        self.matrix.dot(&b).to_vec()
    }

    /// Cosine block of the basis.
    pub fn cos_block(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![.., ..self.modes])
    }

    /// Sine block of the basis.
    pub fn sin_block(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![.., self.modes..])
    }
}
