//! The per-worker loop over a partition of grid cells.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, info_span, warn};

use cfact_io::{
    ArtifactStore, CellRecord, GriddedSeries, LandMask, OutputCheck, check_cell_output,
    write_cell_output,
};
use cfact_model::{DetrendModel, ModelConfig, Reconstruction, RegressionFrame, check_regressor};
use cfact_sampler::Sampler;

use crate::cells::enumerate_cells;
use crate::config::BatchConfig;
use crate::error::{BatchError, CellError, classify_model};
use crate::estimator::{CellEstimator, TraceSource};
use crate::partition::Partition;
use crate::summary::BatchSummary;

/// Immutable inputs shared by every cell of a worker.
#[derive(Debug, Clone, Copy)]
pub struct BatchInputs<'a> {
    pub grid: &'a GriddedSeries,
    pub gmt: &'a [f64],
    pub mask: Option<&'a LandMask>,
}

/// What happened to one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    /// A valid output already existed.
    Cached,
    /// A new output was written.
    Completed { source: TraceSource },
    /// The cell was skipped or failed.
    Skipped(CellError),
}

/// Everything a worker needs besides the inputs.
pub struct BatchRunner<'a> {
    model: &'a ModelConfig,
    sampler: &'a dyn Sampler,
    store: &'a ArtifactStore,
    config: &'a BatchConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        model: &'a ModelConfig,
        sampler: &'a dyn Sampler,
        store: &'a ArtifactStore,
        config: &'a BatchConfig,
    ) -> Self {
        Self {
            model,
            sampler,
            store,
            config,
        }
    }

    /// Processes this worker's share of the grid in index order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] for configuration problems,
    /// [`BatchError::InvalidInput`] for a time axis, regressor or mask that
    /// cannot be used, and [`BatchError::Persist`] if a result cannot be
    /// written. Per-cell failures are logged and counted instead.
    pub fn run(
        &self,
        inputs: BatchInputs<'_>,
        partition: Partition,
    ) -> Result<BatchSummary, BatchError> {
        let start = Instant::now();
        let _span = info_span!(
            "worker",
            task_id = partition.task_id(),
            n_tasks = partition.n_tasks()
        )
        .entered();

        self.config.validate()?;
        self.model.validate().map_err(|e| BatchError::InvalidConfig {
            reason: e.to_string(),
        })?;
        check_regressor(inputs.gmt).map_err(|e| BatchError::InvalidInput {
            reason: e.to_string(),
        })?;
        let dates = inputs
            .grid
            .axes()
            .time_axis()
            .dates()
            .map_err(|e| BatchError::InvalidInput {
                reason: e.to_string(),
            })?;

        let cells = enumerate_cells(inputs.grid.axes(), inputs.mask)?;
        let range = partition.range(cells.len(), self.config.require_even_split())?;
        let mine = &cells[range.clone()];
        info!(
            total_cells = cells.len(),
            first = range.start,
            end = range.end,
            "partition assigned"
        );

        let estimator = CellEstimator::new(
            self.sampler,
            self.store,
            self.config.writer(),
            self.config.timeout(),
        );
        let mut summary = BatchSummary {
            task_id: partition.task_id(),
            n_tasks: partition.n_tasks(),
            cells: mine.len(),
            ..BatchSummary::default()
        };

        for (i, cell) in mine.iter().enumerate() {
            let _cell = info_span!("cell", row = cell.row, col = cell.col).entered();
            let outcome = self.process_cell(inputs, &dates, cell, &estimator)?;
            match &outcome {
                CellOutcome::Cached => summary.cached += 1,
                CellOutcome::Completed { source } => {
                    summary.completed += 1;
                    if *source == TraceSource::Loaded {
                        summary.resumed += 1;
                    }
                }
                CellOutcome::Skipped(CellError::Degenerate { reason }) => {
                    info!(lat = cell.lat, lon = cell.lon, reason = %reason, "cell skipped");
                    summary.skipped_degenerate += 1;
                }
                CellOutcome::Skipped(e) => {
                    warn!(lat = cell.lat, lon = cell.lon, kind = e.kind(), error = %e, "cell failed");
                    summary.failed += 1;
                }
            }
            debug!(done = i + 1, of = mine.len(), "progress");
        }

        summary.elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            completed = summary.completed,
            resumed = summary.resumed,
            cached = summary.cached,
            skipped_degenerate = summary.skipped_degenerate,
            failed = summary.failed,
            elapsed_secs = summary.elapsed_secs,
            "partition finished"
        );
        Ok(summary)
    }

    fn process_cell(
        &self,
        inputs: BatchInputs<'_>,
        dates: &[NaiveDate],
        cell: &CellRecord,
        estimator: &CellEstimator<'_>,
    ) -> Result<CellOutcome, BatchError> {
        if self.config.skip_if_exists() {
            match check_cell_output(&self.store.output_path(cell), dates.len()) {
                OutputCheck::Valid => {
                    debug!("valid output exists");
                    return Ok(CellOutcome::Cached);
                }
                OutputCheck::Invalid { reason } => {
                    info!(reason = %reason, "existing output unusable, recomputing");
                }
                OutputCheck::Missing => {}
            }
        }

        let y = inputs.grid.cell_series(cell);
        let frame = match RegressionFrame::from_dates(dates.to_vec(), &y, inputs.gmt) {
            Ok(frame) => frame,
            Err(e) => return classify_model(e).map(CellOutcome::Skipped),
        };
        let model = match DetrendModel::new(&frame, self.model) {
            Ok(model) => model,
            Err(e) => return classify_model(e).map(CellOutcome::Skipped),
        };

        let (trace, source) = match estimator.fit_or_load(cell, &model)? {
            Ok(fitted) => fitted,
            Err(e) => return Ok(CellOutcome::Skipped(e)),
        };

        let recon = match Reconstruction::new(&trace, model.basis(), frame) {
            Ok(r) => r.with_bounds(self.config.bounds()),
            Err(e) => return classify_model(e).map(CellOutcome::Skipped),
        };
        let path = write_cell_output(self.store, cell, &recon, self.config.writer())
            .map_err(|source| BatchError::Persist {
                what: "cell output",
                source,
            })?;
        info!(lat = cell.lat, lon = cell.lon, path = %path.display(), "cell completed");
        Ok(CellOutcome::Completed { source })
    }
}
