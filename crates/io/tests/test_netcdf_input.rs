//! Integration tests for the gridded, GMT and land-mask NetCDF readers.

use std::path::{Path, PathBuf};

use tempfile::tempdir;

use cfact_io::{IoError, ReaderConfig, read_gmt, read_grid_axes, read_gridded, read_land_mask};

// ---------------------------------------------------------------------------
// Helper: programmatic NetCDF fixture builder
// ---------------------------------------------------------------------------

/// Configuration for building a minimal `(time, lat, lon)` fixture.
struct FixtureBuilder {
    nx: usize,
    ny: usize,
    nt: usize,
    lat_name: &'static str,
    lon_name: &'static str,
    lons: Vec<f64>,
    lats: Vec<f64>,
    /// Flat data in `[t, lat, lon]` order.
    data: Vec<f64>,
    fill_value: Option<f64>,
    units: Option<&'static str>,
    calendar: Option<&'static str>,
}

impl FixtureBuilder {
    fn new(nx: usize, ny: usize, nt: usize) -> Self {
        let n = nt * nx * ny;
        Self {
            nx,
            ny,
            nt,
            lat_name: "lat",
            lon_name: "lon",
            lons: (0..nx).map(|i| 10.0 + 0.5 * i as f64).collect(),
            lats: (0..ny).map(|i| 50.0 + 0.5 * i as f64).collect(),
            data: (0..n).map(|i| 270.0 + (i % 17) as f64).collect(),
            fill_value: None,
            units: Some("days since 2000-01-01"),
            calendar: Some("standard"),
        }
    }

    fn with_long_coordinate_names(mut self) -> Self {
        self.lat_name = "latitude";
        self.lon_name = "longitude";
        self
    }

    /// Set a cell's data across all timesteps to `value`.
    fn with_cell_const(mut self, row: usize, col: usize, value: f64) -> Self {
        let n_cells = self.nx * self.ny;
        for t in 0..self.nt {
            self.data[t * n_cells + row * self.nx + col] = value;
        }
        self
    }

    fn with_fill_value(mut self, fv: f64) -> Self {
        self.fill_value = Some(fv);
        self
    }

    fn without_units(mut self) -> Self {
        self.units = None;
        self
    }

    fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join("input.nc");
        let mut file = netcdf::create(&path).expect("failed to create NetCDF file");

        file.add_dimension("time", self.nt).expect("add dim time");
        file.add_dimension(self.lat_name, self.ny).expect("add dim lat");
        file.add_dimension(self.lon_name, self.nx).expect("add dim lon");

        {
            let mut var = file
                .add_variable::<f64>(self.lon_name, &[self.lon_name])
                .expect("add var lon");
            var.put_values(&self.lons, ..).expect("put lon values");
        }
        {
            let mut var = file
                .add_variable::<f64>(self.lat_name, &[self.lat_name])
                .expect("add var lat");
            var.put_values(&self.lats, ..).expect("put lat values");
        }
        {
            let time_vals: Vec<f64> = (0..self.nt).map(|t| t as f64).collect();
            let mut var = file
                .add_variable::<f64>("time", &["time"])
                .expect("add var time");
            var.put_values(&time_vals, ..).expect("put time values");
            if let Some(units) = self.units {
                var.put_attribute("units", units).expect("add time units");
            }
            if let Some(calendar) = self.calendar {
                var.put_attribute("calendar", calendar)
                    .expect("add time calendar");
            }
        }
        {
            let mut var = file
                .add_variable::<f64>("tas", &["time", self.lat_name, self.lon_name])
                .expect("add var tas");
            if let Some(fv) = self.fill_value {
                var.put_attribute("_FillValue", fv)
                    .expect("add tas _FillValue");
            }
            var.put_values(&self.data, ..).expect("put tas values");
        }

        path
    }
}

fn write_gmt(dir: &Path, values: &[f64], with_singleton: bool) -> PathBuf {
    let path = dir.join("gmt.nc");
    let mut file = netcdf::create(&path).expect("create gmt file");
    file.add_dimension("time", values.len()).expect("add dim time");
    let dims: &[&str] = if with_singleton {
        file.add_dimension("lat", 1).expect("add dim lat");
        file.add_dimension("lon", 1).expect("add dim lon");
        &["time", "lat", "lon"]
    } else {
        &["time"]
    };
    let mut var = file.add_variable::<f64>("tas", dims).expect("add var tas");
    var.put_values(values, ..).expect("put gmt values");
    path
}

fn write_mask(dir: &Path, ny: usize, nx: usize, values: &[f64]) -> PathBuf {
    let path = dir.join("mask.nc");
    let mut file = netcdf::create(&path).expect("create mask file");
    file.add_dimension("time", 1).expect("add dim time");
    file.add_dimension("lat", ny).expect("add dim lat");
    file.add_dimension("lon", nx).expect("add dim lon");
    let mut var = file
        .add_variable::<f64>("LSM", &["time", "lat", "lon"])
        .expect("add var LSM");
    var.put_values(values, ..).expect("put mask values");
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn gridded_input_shape_and_axes() {
    let dir = tempdir().unwrap();
    let path = FixtureBuilder::new(3, 2, 20).write(dir.path());

    let grid = read_gridded(&path, &ReaderConfig::new("tas")).unwrap();
    assert_eq!(grid.variable(), "tas");
    assert_eq!(grid.axes().shape(), (20, 2, 3));
    assert_eq!(grid.axes().lats(), &[50.0, 50.5]);
    assert_eq!(grid.axes().time_units(), "days since 2000-01-01");
    assert_eq!(grid.axes().calendar(), Some("standard"));

    let dates = grid.axes().time_axis().dates().unwrap();
    assert_eq!(dates.len(), 20);
    assert_eq!(dates[0].to_string(), "2000-01-01");
}

#[test]
fn cell_series_follows_time_axis() {
    let dir = tempdir().unwrap();
    let fixture = FixtureBuilder::new(3, 2, 5);
    let expected: Vec<f64> = (0..5).map(|t| fixture.data[t * 6 + 4]).collect();
    let path = fixture.write(dir.path());

    let grid = read_gridded(&path, &ReaderConfig::new("tas")).unwrap();
    let cell = grid.axes().cell(1, 1).unwrap();
    assert_eq!(grid.cell_series(&cell), expected);
}

#[test]
fn fill_values_become_nan() {
    let dir = tempdir().unwrap();
    let path = FixtureBuilder::new(2, 2, 8)
        .with_fill_value(-9999.0)
        .with_cell_const(0, 1, -9999.0)
        .write(dir.path());

    let grid = read_gridded(&path, &ReaderConfig::new("tas")).unwrap();
    let missing = grid.axes().cell(0, 1).unwrap();
    assert!(grid.cell_series(&missing).iter().all(|v| v.is_nan()));
    let present = grid.axes().cell(1, 0).unwrap();
    assert!(grid.cell_series(&present).iter().all(|v| v.is_finite()));
}

#[test]
fn coordinate_aliases_resolved() {
    let dir = tempdir().unwrap();
    let path = FixtureBuilder::new(2, 3, 4)
        .with_long_coordinate_names()
        .write(dir.path());

    let axes = read_grid_axes(&path, &ReaderConfig::new("tas")).unwrap();
    assert_eq!(axes.shape(), (4, 3, 2));
    assert_eq!(axes.lons(), &[10.0, 10.5]);
}

#[test]
fn time_without_units_rejected() {
    let dir = tempdir().unwrap();
    let path = FixtureBuilder::new(2, 2, 4).without_units().write(dir.path());
    let err = read_gridded(&path, &ReaderConfig::new("tas")).unwrap_err();
    assert!(matches!(err, IoError::InvalidTime { .. }));
}

#[test]
fn missing_variable_reported() {
    let dir = tempdir().unwrap();
    let path = FixtureBuilder::new(2, 2, 4).write(dir.path());
    let err = read_gridded(&path, &ReaderConfig::new("pr")).unwrap_err();
    assert!(matches!(err, IoError::MissingVariable { ref name, .. } if name == "pr"));
}

#[test]
fn gmt_read_and_squeezed() {
    let dir = tempdir().unwrap();
    let values: Vec<f64> = (0..12).map(|i| 13.5 + 0.01 * i as f64).collect();

    let flat = write_gmt(dir.path(), &values, false);
    assert_eq!(read_gmt(&flat, &ReaderConfig::default()).unwrap(), values);

    let nested_dir = tempdir().unwrap();
    let nested = write_gmt(nested_dir.path(), &values, true);
    assert_eq!(read_gmt(&nested, &ReaderConfig::default()).unwrap(), values);
}

#[test]
fn land_mask_marks_ones() {
    let dir = tempdir().unwrap();
    let grid_path = FixtureBuilder::new(2, 2, 3).write(dir.path());
    let axes = read_grid_axes(&grid_path, &ReaderConfig::default()).unwrap();

    let mask_path = write_mask(dir.path(), 2, 2, &[1.0, 0.0, 0.0, 1.0]);
    let mask = read_land_mask(&mask_path, &ReaderConfig::default(), &axes).unwrap();
    assert!(mask.is_land(0, 0));
    assert!(!mask.is_land(0, 1));
    assert!(mask.is_land(1, 1));
    assert_eq!(mask.n_land(), 2);
}

#[test]
fn land_mask_shape_mismatch_rejected() {
    let dir = tempdir().unwrap();
    let grid_path = FixtureBuilder::new(3, 2, 3).write(dir.path());
    let axes = read_grid_axes(&grid_path, &ReaderConfig::default()).unwrap();

    let mask_path = write_mask(dir.path(), 2, 2, &[1.0; 4]);
    let err = read_land_mask(&mask_path, &ReaderConfig::default(), &axes).unwrap_err();
    assert!(matches!(err, IoError::DimensionMismatch { .. }));
}
