//! Merge command: assemble per-cell outputs into a gridded NetCDF file.

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use cfact_io::{VALUE_COLUMNS, merge_outputs, read_grid_axes};

use crate::cli::MergeArgs;
use crate::config::CfactConfig;
use crate::convert;

/// Run the merge step.
pub fn run(args: MergeArgs) -> Result<()> {
    let _cmd = info_span!("merge").entered();

    let config = CfactConfig::load(&args.config)?;
    if let Some(unknown) = args
        .columns
        .iter()
        .find(|c| !VALUE_COLUMNS.contains(&c.as_str()))
    {
        bail!("unknown output column {unknown:?}; expected one of {VALUE_COLUMNS:?}");
    }
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();

    let reader_cfg = convert::build_reader_config(&config.io)?;
    let store = convert::build_store(&config.io);
    let dest = args.output.unwrap_or_else(|| store.merged_path());

    let axes = read_grid_axes(&config.io.input, &reader_cfg)
        .with_context(|| format!("failed to read grid: {}", config.io.input.display()))?;
    info!(dir = %store.timeseries_dir().display(), "merging cell outputs");
    let summary = merge_outputs(&store, &axes, &columns, &dest)
        .with_context(|| format!("failed to write merged NetCDF: {}", dest.display()))?;

    if summary.skipped > 0 {
        warn!(skipped = summary.skipped, "some outputs could not be merged");
    }
    info!(
        path = %dest.display(),
        merged = summary.merged,
        empty = summary.empty,
        "merge finished"
    );
    Ok(())
}
