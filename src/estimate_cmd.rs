//! Estimate command: fit and reconstruct this worker's cells.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use cfact_batch::{BatchInputs, BatchRunner, Partition};
use cfact_io::{read_gmt, read_gridded, read_land_mask};
use cfact_sampler::EnsembleSampler;

use crate::cli::EstimateArgs;
use crate::config::CfactConfig;
use crate::convert;

/// Run one worker of the estimation pipeline.
pub fn run(args: EstimateArgs) -> Result<()> {
    let _cmd = info_span!("estimate").entered();

    // 1. Configuration, all validated before any data is read
    let mut config = CfactConfig::load(&args.config)?;
    if let Some(dir) = args.output {
        config.io.output_dir = dir;
    }
    let partition = match (args.task_id, args.n_tasks) {
        (None, None) => Partition::single(),
        (task_id, n_tasks) => Partition::new(task_id.unwrap_or(0), n_tasks.unwrap_or(1))
            .context("invalid task partition")?,
    };
    let reader_cfg = convert::build_reader_config(&config.io)?;
    let model_cfg = convert::build_model_config(&config.model)?;
    let sampler_cfg = convert::build_sampler_config(&config.sampler, args.seed)?;
    let batch_cfg = convert::build_batch_config(&config)?;
    let store = convert::build_store(&config.io);
    let sampler = EnsembleSampler::new(sampler_cfg).context("failed to build sampler")?;

    // 2. Inputs, loaded once and shared by every cell
    let io = &config.io;
    info!(path = %io.input.display(), variable = %io.variable, "reading input grid");
    let grid = read_gridded(&io.input, &reader_cfg)
        .with_context(|| format!("failed to read NetCDF: {}", io.input.display()))?;
    let gmt = read_gmt(&io.gmt, &reader_cfg)
        .with_context(|| format!("failed to read GMT: {}", io.gmt.display()))?;
    let mask = io
        .mask
        .as_ref()
        .map(|path| {
            read_land_mask(path, &reader_cfg, grid.axes())
                .with_context(|| format!("failed to read land mask: {}", path.display()))
        })
        .transpose()?;
    if let Some(m) = &mask {
        info!(land_cells = m.n_land(), "land mask loaded");
    }

    // 3. Process the partition
    let inputs = BatchInputs {
        grid: &grid,
        gmt: &gmt,
        mask: mask.as_ref(),
    };
    let summary = BatchRunner::new(&model_cfg, &sampler, &store, &batch_cfg)
        .run(inputs, partition)
        .context("estimation aborted")?;

    // 4. Summary
    let path = store.summary_path(partition.task_id());
    summary
        .write_json(&path)
        .with_context(|| format!("failed to write summary: {}", path.display()))?;
    info!(
        path = %path.display(),
        completed = summary.completed,
        cached = summary.cached,
        skipped = summary.skipped_degenerate,
        failed = summary.failed,
        elapsed_secs = summary.elapsed_secs,
        "estimation finished"
    );
    Ok(())
}
