//! Enumeration of the cells to process.

use cfact_io::{CellRecord, GridAxes, LandMask};

use crate::error::BatchError;

/// All `(row, col)` cells of the grid in row-major order, restricted to land
/// cells when a mask is given.
///
/// # Errors
///
/// Returns [`BatchError::InvalidInput`] if the mask is not aligned to the grid.
pub fn enumerate_cells(
    axes: &GridAxes,
    mask: Option<&LandMask>,
) -> Result<Vec<CellRecord>, BatchError> {
    let (_, ny, nx) = axes.shape();
    if let Some(m) = mask
        && m.shape() != (ny, nx)
    {
        return Err(BatchError::InvalidInput {
            reason: format!("mask shape {:?} differs from grid ({ny}, {nx})", m.shape()),
        });
    }
    Ok((0..ny)
        .flat_map(|row| (0..nx).map(move |col| (row, col)))
        .filter(|&(row, col)| mask.is_none_or(|m| m.is_land(row, col)))
        .filter_map(|(row, col)| axes.cell(row, col))
        .collect())
}
