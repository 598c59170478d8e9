//! NetCDF reader configuration and the gridded, GMT and mask readers.

use std::path::Path;

use ndarray::Array3;
use tracing::{debug, info};

use crate::error::IoError;
use crate::grid::{GridAxes, GriddedSeries, LandMask};
use crate::netcdf_read;

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Names of the variables and coordinates to look up in input files.
///
/// The [`Default`] implementation supplies CF-convention names suitable for
/// ISIMIP-style climate data.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Variable to detrend in the gridded dataset.
    variable: String,
    /// GMT series variable in the GMT file.
    gmt_var: String,
    /// Land/sea mask variable in the mask file.
    mask_var: String,
    /// Aliases to try when looking up longitude coordinates.
    lon_aliases: Vec<String>,
    /// Aliases to try when looking up latitude coordinates.
    lat_aliases: Vec<String>,
    /// NetCDF variable name for the time axis.
    time_var: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            variable: "tas".into(),
            gmt_var: "tas".into(),
            mask_var: "LSM".into(),
            lon_aliases: vec!["lon".into(), "longitude".into(), "x".into()],
            lat_aliases: vec!["lat".into(), "latitude".into(), "y".into()],
            time_var: "time".into(),
        }
    }
}

impl ReaderConfig {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            ..Self::default()
        }
    }

    pub fn with_gmt_var(mut self, name: impl Into<String>) -> Self {
        self.gmt_var = name.into();
        self
    }

    pub fn with_mask_var(mut self, name: impl Into<String>) -> Self {
        self.mask_var = name.into();
        self
    }

    pub fn with_time_var(mut self, name: impl Into<String>) -> Self {
        self.time_var = name.into();
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn gmt_var(&self) -> &str {
        &self.gmt_var
    }

    pub fn mask_var(&self) -> &str {
        &self.mask_var
    }

    /// Validate that every name is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing each empty name.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut problems = Vec::new();
        for (what, name) in [
            ("variable", &self.variable),
            ("gmt_var", &self.gmt_var),
            ("mask_var", &self.mask_var),
            ("time_var", &self.time_var),
        ] {
            if name.trim().is_empty() {
                problems.push(format!("{what} must not be empty"));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: problems.len(),
                details: problems.join("; "),
            })
        }
    }

    fn lat_aliases(&self) -> Vec<&str> {
        self.lat_aliases.iter().map(String::as_str).collect()
    }

    fn lon_aliases(&self) -> Vec<&str> {
        self.lon_aliases.iter().map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// Gridded input
// ---------------------------------------------------------------------------

/// Read only the coordinates and time axis of a gridded file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::MissingVariable`] for a
/// missing coordinate or time variable, or [`IoError::InvalidTime`] if the
/// time variable has no `units`.
pub fn read_grid_axes(path: &Path, config: &ReaderConfig) -> Result<GridAxes, IoError> {
    let file = netcdf_read::open_file(path)?;
    axes_of(&file, path, config)
}

fn axes_of(file: &netcdf::File, path: &Path, config: &ReaderConfig) -> Result<GridAxes, IoError> {
    let lats = netcdf_read::read_1d_f64(file, &config.lat_aliases(), path)?;
    let lons = netcdf_read::read_1d_f64(file, &config.lon_aliases(), path)?;
    let (time_values, units, calendar) = netcdf_read::read_time(file, &config.time_var, path)?;
    Ok(GridAxes::new(lats, lons, time_values, units, calendar))
}

/// Read the configured `(time, lat, lon)` variable with its axes.
///
/// Fill and missing values become `NaN`.
///
/// # Errors
///
/// As [`read_grid_axes`], plus [`IoError::DimensionMismatch`] if the
/// variable is not 3-D or its dimensions disagree with the axes.
pub fn read_gridded(path: &Path, config: &ReaderConfig) -> Result<GriddedSeries, IoError> {
    config.validate()?;
    let file = netcdf_read::open_file(path)?;
    let axes = axes_of(&file, path, config)?;
    let var = netcdf_read::find_variable(&file, &[config.variable.as_str()], path)?;

    let shape = netcdf_read::shape(&var);
    if shape.len() != 3 {
        return Err(IoError::DimensionMismatch {
            name: format!("{} dimensions", config.variable),
            expected: 3,
            got: shape.len(),
        });
    }
    let data = netcdf_read::read_masked(&var)?;
    let cube = Array3::from_shape_vec((shape[0], shape[1], shape[2]), data).map_err(|e| {
        IoError::Validation {
            count: 1,
            details: e.to_string(),
        }
    })?;

    let (nt, ny, nx) = axes.shape();
    info!(
        path = %path.display(),
        variable = %config.variable,
        nt,
        ny,
        nx,
        "gridded input loaded"
    );
    GriddedSeries::new(config.variable.clone(), axes, cube)
}

// ---------------------------------------------------------------------------
// GMT and mask
// ---------------------------------------------------------------------------

/// Read the GMT series.
///
/// The variable may carry extra dimensions of length one, which are squeezed.
///
/// # Errors
///
/// Returns [`IoError::MissingVariable`] if absent, or
/// [`IoError::DimensionMismatch`] if more than one dimension is longer than one.
pub fn read_gmt(path: &Path, config: &ReaderConfig) -> Result<Vec<f64>, IoError> {
    let file = netcdf_read::open_file(path)?;
    let var = netcdf_read::find_variable(&file, &[config.gmt_var.as_str()], path)?;
    let long_dims = netcdf_read::shape(&var).iter().filter(|&&n| n > 1).count();
    if long_dims > 1 {
        return Err(IoError::DimensionMismatch {
            name: format!("{} non-singleton dimensions", config.gmt_var),
            expected: 1,
            got: long_dims,
        });
    }
    let gmt = netcdf_read::read_masked(&var)?;
    debug!(path = %path.display(), len = gmt.len(), "GMT series loaded");
    Ok(gmt)
}

/// Read a land/sea mask aligned to `axes`, taking the first `lat × lon` slab.
///
/// # Errors
///
/// Returns [`IoError::MissingVariable`] if absent, or
/// [`IoError::DimensionMismatch`] if the trailing dimensions are not the
/// grid's `(lat, lon)`.
pub fn read_land_mask(
    path: &Path,
    config: &ReaderConfig,
    axes: &GridAxes,
) -> Result<LandMask, IoError> {
    let file = netcdf_read::open_file(path)?;
    let var = netcdf_read::find_variable(&file, &[config.mask_var.as_str()], path)?;
    let (_, ny, nx) = axes.shape();
    let shape = netcdf_read::shape(&var);
    let trailing = if shape.len() >= 2 {
        (shape[shape.len() - 2], shape[shape.len() - 1])
    } else {
        (0, shape.first().copied().unwrap_or(0))
    };
    if trailing != (ny, nx) {
        return Err(IoError::DimensionMismatch {
            name: format!("{} (lat, lon) cells", config.mask_var),
            expected: ny * nx,
            got: trailing.0 * trailing.1,
        });
    }
    let mask = LandMask::from_values(ny, nx, &netcdf_read::read_masked(&var)?)?;
    info!(path = %path.display(), land_cells = mask.n_land(), "land mask loaded");
    Ok(mask)
}
