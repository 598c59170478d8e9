//! Assembly of per-cell outputs into one gridded NetCDF file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::{Array3, s};
use tracing::{debug, info, warn};

use crate::error::IoError;
use crate::grid::GridAxes;
use crate::output::read_cell_output;
use crate::store::ArtifactStore;

/// Counts from one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Cells placed on the grid.
    pub merged: usize,
    /// Output files that could not be read or placed.
    pub skipped: usize,
    /// Grid cells with no output.
    pub empty: usize,
}

/// Recursively lists the output files of `store` in path order.
fn output_files(store: &ArtifactStore) -> Result<Vec<PathBuf>, IoError> {
    let mut files = Vec::new();
    let mut pending = vec![store.timeseries_dir()];
    while let Some(dir) = pending.pop() {
        if !dir.exists() {
            continue;
        }
        for entry in std::fs::read_dir(&dir).map_err(|e| IoError::fs(&dir, e))? {
            let path = entry.map_err(|e| IoError::fs(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if store.is_output_file(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Places `columns` of every output of `store` on the grid described by
/// `axes` and writes the result to `dest`.
///
/// Each file's cell is recovered from its metadata and matched to the
/// nearest grid coordinate. Cells without output are `NaN`. Files that are
/// unreadable, off-grid or of the wrong length are logged and skipped.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if `columns` is empty, [`IoError::Fs`] if
/// the output tree cannot be listed, or [`IoError::Netcdf`] if writing fails.
pub fn merge_outputs(
    store: &ArtifactStore,
    axes: &GridAxes,
    columns: &[&str],
    dest: &Path,
) -> Result<MergeSummary, IoError> {
    if columns.is_empty() {
        return Err(IoError::Validation {
            count: 1,
            details: "no columns selected for merge".to_string(),
        });
    }
    let (nt, ny, nx) = axes.shape();
    let mut cubes: BTreeMap<&str, Array3<f64>> = columns
        .iter()
        .map(|c| (*c, Array3::from_elem((nt, ny, nx), f64::NAN)))
        .collect();
    let mut summary = MergeSummary::default();

    for path in output_files(store)? {
        let out = match read_cell_output(&path, columns) {
            Ok(out) => out,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable output skipped");
                summary.skipped += 1;
                continue;
            }
        };
        let Some((row, col)) = axes.locate(out.cell.lat, out.cell.lon) else {
            warn!(
                path = %path.display(),
                lat = out.cell.lat,
                lon = out.cell.lon,
                "output not on grid, skipped"
            );
            summary.skipped += 1;
            continue;
        };
        if out.len() != nt {
            warn!(
                path = %path.display(),
                rows = out.len(),
                expected = nt,
                "output length differs from grid, skipped"
            );
            summary.skipped += 1;
            continue;
        }
        for (name, cube) in cubes.iter_mut() {
            if let Some(values) = out.column(name) {
                cube.slice_mut(s![.., row, col])
                    .iter_mut()
                    .zip(values)
                    .for_each(|(dst, v)| *dst = *v);
            }
        }
        debug!(row, col, "cell merged");
        summary.merged += 1;
    }
    summary.empty = axes.n_cells().saturating_sub(summary.merged);

    write_netcdf(dest, axes, &cubes)?;
    info!(
        path = %dest.display(),
        merged = summary.merged,
        skipped = summary.skipped,
        empty = summary.empty,
        "merged output written"
    );
    Ok(summary)
}

fn write_netcdf(
    dest: &Path,
    axes: &GridAxes,
    cubes: &BTreeMap<&str, Array3<f64>>,
) -> Result<(), IoError> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| IoError::fs(parent, e))?;
    }
    let (nt, ny, nx) = axes.shape();
    let mut file = netcdf::create(dest)?;
    file.add_dimension("time", nt)?;
    file.add_dimension("lat", ny)?;
    file.add_dimension("lon", nx)?;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", axes.time_units())?;
        if let Some(calendar) = axes.calendar() {
            var.put_attribute("calendar", calendar)?;
        }
        var.put_values(axes.time_values(), ..)?;
    }
    for (name, values, units) in [
        ("lat", axes.lats(), "degrees_north"),
        ("lon", axes.lons(), "degrees_east"),
    ] {
        let mut var = file.add_variable::<f64>(name, &[name])?;
        var.put_attribute("units", units)?;
        var.put_values(values, ..)?;
    }
    for (name, cube) in cubes {
        let mut var = file.add_variable::<f64>(name, &["time", "lat", "lon"])?;
        var.set_fill_value(f64::NAN)?;
        let flat: Vec<f64> = cube.iter().copied().collect();
        var.put_values(&flat, ..)?;
    }
    Ok(())
}
