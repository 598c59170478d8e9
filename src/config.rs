use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level cfact configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CfactConfig {
    /// Input and output locations.
    pub io: IoConfig,

    /// Model and prior settings.
    #[serde(default)]
    pub model: ModelToml,

    /// Sampler settings.
    #[serde(default)]
    pub sampler: SamplerToml,

    /// Worker settings.
    #[serde(default)]
    pub batch: BatchToml,

    /// Clamp applied to each counterfactual.
    #[serde(default)]
    pub bounds: BoundsToml,
}

impl CfactConfig {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    /// Gridded NetCDF input.
    pub input: PathBuf,
    /// NetCDF file holding the GMT series.
    pub gmt: PathBuf,
    /// Optional NetCDF land/sea mask.
    #[serde(default)]
    pub mask: Option<PathBuf>,
    #[serde(default = "default_variable")]
    pub variable: String,
    /// Dataset label used in artifact names.
    pub dataset: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_gmt_var")]
    pub gmt_var: String,
    #[serde(default = "default_mask_var")]
    pub mask_var: String,
    #[serde(default = "default_time_var")]
    pub time_var: String,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

fn default_variable() -> String {
    "tas".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_gmt_var() -> String {
    "tas".to_string()
}
fn default_mask_var() -> String {
    "LSM".to_string()
}
fn default_time_var() -> String {
    "time".to_string()
}
fn default_compression() -> String {
    "snappy".to_string()
}
fn default_row_group_size() -> usize {
    1_000_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default = "default_modes")]
    pub modes: usize,
    #[serde(default = "default_linear_mu")]
    pub linear_mu: f64,
    #[serde(default = "default_linear_sigma")]
    pub linear_sigma: f64,
    #[serde(default = "default_sigma_beta")]
    pub sigma_beta: f64,
    #[serde(default)]
    pub smu: f64,
    #[serde(default = "default_prior_sd")]
    pub sps: f64,
    #[serde(default)]
    pub stmu: f64,
    #[serde(default = "default_prior_sd")]
    pub stps: f64,
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            linear_mu: default_linear_mu(),
            linear_sigma: default_linear_sigma(),
            sigma_beta: default_sigma_beta(),
            smu: 0.0,
            sps: default_prior_sd(),
            stmu: 0.0,
            stps: default_prior_sd(),
        }
    }
}

fn default_modes() -> usize {
    3
}
fn default_linear_mu() -> f64 {
    0.5
}
fn default_linear_sigma() -> f64 {
    5.0
}
fn default_sigma_beta() -> f64 {
    0.5
}
fn default_prior_sd() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerToml {
    #[serde(default = "default_draws")]
    pub draws: usize,
    #[serde(default = "default_chains")]
    pub chains: usize,
    #[serde(default = "default_tune")]
    pub tune: usize,
    /// Walkers per chain; derived from the model size when unset.
    #[serde(default)]
    pub walkers: Option<usize>,
    #[serde(default = "default_init")]
    pub init: String,
    #[serde(default = "default_cores")]
    pub cores: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_min_acceptance")]
    pub min_acceptance: f64,
    #[serde(default)]
    pub max_rhat: Option<f64>,
}

impl Default for SamplerToml {
    fn default() -> Self {
        Self {
            draws: default_draws(),
            chains: default_chains(),
            tune: default_tune(),
            walkers: None,
            init: default_init(),
            cores: default_cores(),
            seed: 0,
            min_acceptance: default_min_acceptance(),
            max_rhat: None,
        }
    }
}

fn default_draws() -> usize {
    1000
}
fn default_chains() -> usize {
    2
}
fn default_tune() -> usize {
    500
}
fn default_init() -> String {
    "least_squares".to_string()
}
fn default_cores() -> usize {
    1
}
fn default_min_acceptance() -> f64 {
    0.01
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchToml {
    /// Per-cell wall-clock budget; unlimited when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub skip_if_exists: bool,
    #[serde(default)]
    pub require_even_split: bool,
}

impl Default for BatchToml {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            skip_if_exists: true,
            require_even_split: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundsToml {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}
