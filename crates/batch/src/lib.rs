//! # cfact-batch
//!
//! Resumable estimation over a gridded dataset. Each worker takes a
//! contiguous [`Partition`] of the cell list and walks it in index order.
//! For every cell it either finds a valid output already on disk, reuses a
//! persisted posterior trace, or samples a new one, then writes the
//! counterfactual series.
//!
//! Failures are split in two. A [`BatchError`] stops the worker. A
//! [`CellError`] is logged, counted in the [`BatchSummary`], and the worker
//! moves on to the next cell. Re-running a worker over the same partition
//! does no repeated work.

mod cells;
mod config;
mod error;
mod estimator;
mod partition;
mod run;
mod summary;

pub use cells::enumerate_cells;
pub use config::BatchConfig;
pub use error::{BatchError, CellError};
pub use estimator::{CellEstimator, FitState, TraceSource};
pub use partition::Partition;
pub use run::{BatchInputs, BatchRunner, CellOutcome};
pub use summary::BatchSummary;
