use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Counterfactual climate estimation over gridded daily data.
#[derive(Parser)]
#[command(
    name = "cfact",
    version,
    about = "Remove the GMT-driven trend from gridded daily climate data"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Estimate counterfactuals for this worker's share of the grid.
    Estimate(EstimateArgs),
    /// Assemble per-cell outputs into one gridded NetCDF file.
    Merge(MergeArgs),
}

/// Arguments for the `estimate` subcommand.
#[derive(clap::Args)]
pub struct EstimateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "cfact.toml")]
    pub config: PathBuf,

    /// Index of this worker, starting at 0.
    #[arg(long, env = "SLURM_ARRAY_TASK_ID")]
    pub task_id: Option<usize>,

    /// Total number of workers.
    #[arg(long, env = "SLURM_ARRAY_TASK_COUNT")]
    pub n_tasks: Option<usize>,

    /// Override sampler seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override output directory from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `merge` subcommand.
#[derive(clap::Args)]
pub struct MergeArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "cfact.toml")]
    pub config: PathBuf,

    /// Override the merged NetCDF path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output columns to merge.
    #[arg(long, value_delimiter = ',', default_value = "cfact")]
    pub columns: Vec<String>,
}
