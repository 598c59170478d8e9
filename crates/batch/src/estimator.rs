//! Fit-or-load of one cell's posterior.
//!
//! ```text
//! UNFITTED ──(matching trace on disk)──> TRACE_LOADED ──> FITTED
//!     └──────────(otherwise)────────────> SAMPLING ──> FITTED ──> PERSISTED
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};

use cfact_io::{
    ArtifactStore, CellRecord, WriterConfig, read_trace, trace_is_complete, write_trace,
};
use cfact_model::{DetrendModel, REQUIRED_PARAMS};
use cfact_sampler::{Deadline, LogDensity, Sampler, Trace};

use crate::error::{BatchError, CellError, classify_sampler};

/// States a cell passes through while its posterior is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitState {
    Unfitted,
    TraceLoaded,
    Sampling,
    Fitted,
    Persisted,
}

impl FitState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unfitted => "unfitted",
            Self::TraceLoaded => "trace_loaded",
            Self::Sampling => "sampling",
            Self::Fitted => "fitted",
            Self::Persisted => "persisted",
        }
    }
}

/// Where a fitted trace came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceSource {
    /// Reused from an earlier run.
    Loaded,
    /// Drawn in this run and persisted.
    Sampled,
}

/// Obtains posterior traces for cells, reusing persisted ones.
pub struct CellEstimator<'a> {
    sampler: &'a dyn Sampler,
    store: &'a ArtifactStore,
    writer: &'a WriterConfig,
    timeout: Option<Duration>,
}

impl<'a> CellEstimator<'a> {
    pub fn new(
        sampler: &'a dyn Sampler,
        store: &'a ArtifactStore,
        writer: &'a WriterConfig,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            sampler,
            store,
            writer,
            timeout,
        }
    }

    /// A complete persisted trace for `cell` laid out like `model`, if one
    /// can be read.
    ///
    /// Any read problem or layout difference counts as a cache miss.
    fn load(&self, cell: &CellRecord, model: &DetrendModel) -> Option<Trace> {
        let path = self.store.trace_path(cell);
        match trace_is_complete(&path, &REQUIRED_PARAMS) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable trace, resampling");
                return None;
            }
        }
        match read_trace(&path) {
            Ok(trace) if trace.blocks() == model.blocks() => Some(trace),
            Ok(_) => {
                info!(path = %path.display(), "trace layout differs from model, resampling");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable trace, resampling");
                None
            }
        }
    }

    /// Loads the cell's trace or samples `model` under the per-cell deadline
    /// and persists the result.
    ///
    /// The outer `Result` carries errors that abort the run; the inner one
    /// carries failures confined to this cell.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] for an unusable sampler
    /// configuration and [`BatchError::Persist`] if the trace cannot be
    /// written.
    pub fn fit_or_load(
        &self,
        cell: &CellRecord,
        model: &DetrendModel,
    ) -> Result<Result<(Trace, TraceSource), CellError>, BatchError> {
        let mut state = FitState::Unfitted;
        debug!(row = cell.row, col = cell.col, state = state.as_str());

        if let Some(trace) = self.load(cell, model) {
            state = FitState::TraceLoaded;
            debug!(
                row = cell.row,
                col = cell.col,
                state = state.as_str(),
                "persisted trace reused"
            );
            state = FitState::Fitted;
            debug!(row = cell.row, col = cell.col, state = state.as_str());
            return Ok(Ok((trace, TraceSource::Loaded)));
        }

        state = FitState::Sampling;
        debug!(row = cell.row, col = cell.col, state = state.as_str());
        let deadline = Deadline::new(self.timeout);
        let trace = match self.sampler.sample(model, &deadline) {
            Ok(trace) => trace,
            Err(e) => return classify_sampler(e).map(Err),
        };
        state = FitState::Fitted;
        debug!(
            row = cell.row,
            col = cell.col,
            state = state.as_str(),
            draws = trace.n_draws(),
            elapsed_secs = deadline.elapsed().as_secs_f64()
        );

        let path = self.store.trace_path(cell);
        write_trace(&path, &trace, cell, self.writer).map_err(|source| BatchError::Persist {
            what: "trace",
            source,
        })?;
        state = FitState::Persisted;
        info!(
            lat = cell.lat,
            lon = cell.lon,
            state = state.as_str(),
            elapsed_secs = deadline.elapsed().as_secs_f64(),
            "trace sampled"
        );
        Ok(Ok((trace, TraceSource::Sampled)))
    }
}
