//! In-memory gridded input: coordinates, time axis, data cube and land mask.

use cfact_model::TimeAxis;
use ndarray::{Array2, Array3, s};

use crate::error::IoError;

/// One grid cell, identified by index and coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    pub lat: f64,
    pub lon: f64,
}

/// Coordinates and time axis shared by the input grid and the merged output.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    lats: Vec<f64>,
    lons: Vec<f64>,
    time_values: Vec<f64>,
    time_units: String,
    calendar: Option<String>,
}

impl GridAxes {
    pub fn new(
        lats: Vec<f64>,
        lons: Vec<f64>,
        time_values: Vec<f64>,
        time_units: impl Into<String>,
        calendar: Option<String>,
    ) -> Self {
        Self {
            lats,
            lons,
            time_values,
            time_units: time_units.into(),
            calendar,
        }
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn time_values(&self) -> &[f64] {
        &self.time_values
    }

    pub fn time_units(&self) -> &str {
        &self.time_units
    }

    pub fn calendar(&self) -> Option<&str> {
        self.calendar.as_deref()
    }

    /// `(time, lat, lon)` lengths.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.time_values.len(), self.lats.len(), self.lons.len())
    }

    pub fn n_cells(&self) -> usize {
        self.lats.len() * self.lons.len()
    }

    /// The time axis in the form the model decodes.
    pub fn time_axis(&self) -> TimeAxis {
        TimeAxis::Offsets {
            values: self.time_values.clone(),
            units: self.time_units.clone(),
            calendar: self.calendar.clone(),
        }
    }

    /// Cell at `(row, col)`, or `None` if out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<CellRecord> {
        Some(CellRecord {
            row,
            col,
            lat: *self.lats.get(row)?,
            lon: *self.lons.get(col)?,
        })
    }

    /// Grid indices of the coordinate closest to `(lat, lon)`, provided it
    /// lies within half a grid spacing.
    pub fn locate(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        Some((nearest(&self.lats, lat)?, nearest(&self.lons, lon)?))
    }
}

fn nearest(axis: &[f64], value: f64) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let (idx, dist) = axis
        .iter()
        .enumerate()
        .map(|(i, a)| (i, (a - value).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    let spacing = axis
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);
    let tol = if spacing.is_finite() { 0.5 * spacing } else { 1e-6 };
    (dist <= tol).then_some(idx)
}

/// A `(time, lat, lon)` data cube with its axes.
#[derive(Debug, Clone)]
pub struct GriddedSeries {
    variable: String,
    axes: GridAxes,
    data: Array3<f64>,
}

impl GriddedSeries {
    /// # Errors
    ///
    /// Returns [`IoError::DimensionMismatch`] if `data` does not have the
    /// axes' shape.
    pub fn new(
        variable: impl Into<String>,
        axes: GridAxes,
        data: Array3<f64>,
    ) -> Result<Self, IoError> {
        let (nt, ny, nx) = axes.shape();
        for (name, expected, got) in [
            ("time", nt, data.dim().0),
            ("lat", ny, data.dim().1),
            ("lon", nx, data.dim().2),
        ] {
            if expected != got {
                return Err(IoError::DimensionMismatch {
                    name: name.to_string(),
                    expected,
                    got,
                });
            }
        }
        Ok(Self {
            variable: variable.into(),
            axes,
            data,
        })
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Full time series of one cell.
    pub fn cell_series(&self, cell: &CellRecord) -> Vec<f64> {
        self.data.slice(s![.., cell.row, cell.col]).to_vec()
    }
}

/// Boolean land mask aligned to a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LandMask {
    land: Array2<bool>,
}

impl LandMask {
    pub fn new(land: Array2<bool>) -> Self {
        Self { land }
    }

    /// Builds the mask from numeric values: land where the value is 1
    /// (within rounding), sea or missing elsewhere.
    pub fn from_values(ny: usize, nx: usize, values: &[f64]) -> Result<Self, IoError> {
        if values.len() < ny * nx {
            return Err(IoError::DimensionMismatch {
                name: "mask cells".to_string(),
                expected: ny * nx,
                got: values.len(),
            });
        }
        let land = Array2::from_shape_fn((ny, nx), |(r, c)| (values[r * nx + c] - 1.0).abs() < 0.5);
        Ok(Self { land })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.land.dim()
    }

    pub fn is_land(&self, row: usize, col: usize) -> bool {
        self.land.get((row, col)).copied().unwrap_or(false)
    }

    pub fn n_land(&self) -> usize {
        self.land.iter().filter(|v| **v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> GridAxes {
        GridAxes::new(
            vec![-0.25, 0.25, 0.75],
            vec![10.0, 10.5],
            vec![0.0, 1.0, 2.0, 3.0],
            "days since 2000-01-01",
            None,
        )
    }

    #[test]
    fn locate_snaps_within_half_spacing() {
        let a = axes();
        assert_eq!(a.locate(0.25, 10.5), Some((1, 1)));
        assert_eq!(a.locate(0.3, 10.1), Some((1, 0)));
        assert_eq!(a.locate(5.0, 10.0), None);
        assert_eq!(a.locate(f64::NAN, 10.0), None);
    }

    #[test]
    fn cell_lookup() {
        let a = axes();
        let c = a.cell(2, 1).unwrap();
        assert_eq!((c.lat, c.lon), (0.75, 10.5));
        assert!(a.cell(3, 0).is_none());
        assert_eq!(a.n_cells(), 6);
    }

    #[test]
    fn series_extracts_cell_column() {
        let data = Array3::from_shape_fn((4, 3, 2), |(t, r, c)| (t * 100 + r * 10 + c) as f64);
        let g = GriddedSeries::new("tas", axes(), data).unwrap();
        let cell = g.axes().cell(1, 1).unwrap();
        assert_eq!(g.cell_series(&cell), vec![11.0, 111.0, 211.0, 311.0]);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = GriddedSeries::new("tas", axes(), Array3::zeros((4, 2, 2))).unwrap_err();
        assert!(matches!(err, IoError::DimensionMismatch { ref name, .. } if name == "lat"));
    }

    #[test]
    fn mask_from_values() {
        let m = LandMask::from_values(2, 2, &[1.0, 0.0, f64::NAN, 1.0]).unwrap();
        assert!(m.is_land(0, 0));
        assert!(!m.is_land(0, 1));
        assert!(!m.is_land(1, 0));
        assert!(!m.is_land(5, 5));
        assert_eq!(m.n_land(), 2);
    }
}
