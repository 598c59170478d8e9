//! # cfact-io
//!
//! Read gridded climate input, GMT and land masks from NetCDF; persist
//! per-cell traces and output tables as Parquet; assemble the per-cell
//! outputs back into a gridded NetCDF file.
//!
//! Every per-cell artifact lives at a path derived by [`ArtifactStore`], so
//! the filesystem alone tells a worker which cells are done.

mod error;
mod grid;
mod merge;
mod netcdf_read;
mod output;
mod reader;
mod store;
mod trace_store;
mod writer;

pub use error::IoError;
pub use grid::{CellRecord, GridAxes, GriddedSeries, LandMask};
pub use merge::{MergeSummary, merge_outputs};
pub use output::{
    CFACT_COLUMN, CellOutput, DATE_COLUMN, OutputCheck, VALUE_COLUMNS, check_cell_output,
    read_cell_output, write_cell_output,
};
pub use reader::{ReaderConfig, read_gmt, read_grid_axes, read_gridded, read_land_mask};
pub use store::ArtifactStore;
pub use trace_store::{read_trace, trace_is_complete, write_trace};
pub use writer::{Compression, WriterConfig};
