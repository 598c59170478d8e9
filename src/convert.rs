//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use cfact_batch::BatchConfig;
use cfact_io::{ArtifactStore, Compression, ReaderConfig, WriterConfig};
use cfact_model::{ModelConfig, ValueBounds};
use cfact_sampler::{InitStrategy, SamplerConfig};

use crate::config::*;

/// Variables whose counterfactual needs an explicit lower bound.
const BOUNDED_VARIABLES: &[&str] = &["pr", "rsds", "rlds", "rhs", "wind"];

/// Parses a compression algorithm name string into the corresponding enum variant.
pub fn parse_compression(s: &str) -> Result<Compression> {
    match s.to_lowercase().as_str() {
        "none" => Ok(Compression::None),
        "snappy" => Ok(Compression::Snappy),
        "zstd" => Ok(Compression::Zstd),
        other => bail!("unknown compression: {other:?}"),
    }
}

/// Parses a sampler initialisation name into the corresponding enum variant.
pub fn parse_init(s: &str) -> Result<InitStrategy> {
    match s.to_lowercase().as_str() {
        "jitter" | "jitter+adapt_diag" => Ok(InitStrategy::Jitter),
        "least_squares" | "lstsq" => Ok(InitStrategy::LeastSquares),
        "map" | "advi+adapt_diag" => Ok(InitStrategy::Map),
        other => bail!("unknown init strategy: {other:?}"),
    }
}

/// Builds a [`ReaderConfig`] from the TOML I/O configuration.
pub fn build_reader_config(io: &IoConfig) -> Result<ReaderConfig> {
    let cfg = ReaderConfig::new(&io.variable)
        .with_gmt_var(&io.gmt_var)
        .with_mask_var(&io.mask_var)
        .with_time_var(&io.time_var);
    cfg.validate().context("invalid [io] variable names")?;
    Ok(cfg)
}

/// Builds a [`WriterConfig`] from the TOML I/O configuration.
pub fn build_writer_config(io: &IoConfig) -> Result<WriterConfig> {
    let compression = parse_compression(&io.compression)?;
    let cfg = WriterConfig::default()
        .with_compression(compression)
        .with_row_group_size(io.row_group_size);
    cfg.validate().context("invalid [io] writer settings")?;
    Ok(cfg)
}

/// Builds the [`ArtifactStore`] for the configured variable and dataset.
pub fn build_store(io: &IoConfig) -> ArtifactStore {
    ArtifactStore::new(&io.output_dir, &io.variable, &io.dataset)
}

/// Builds a validated [`ModelConfig`] from the TOML model configuration.
pub fn build_model_config(model: &ModelToml) -> Result<ModelConfig> {
    let cfg = ModelConfig::new()
        .with_modes(model.modes)
        .with_linear_prior(model.linear_mu, model.linear_sigma)
        .with_sigma_beta(model.sigma_beta)
        .with_yearly_prior(model.smu, model.sps)
        .with_trend_prior(model.stmu, model.stps);
    cfg.validate().context("invalid [model] section")?;
    Ok(cfg)
}

/// Builds a validated [`SamplerConfig`]; `seed` overrides the TOML seed.
pub fn build_sampler_config(sampler: &SamplerToml, seed: Option<u64>) -> Result<SamplerConfig> {
    let mut cfg = SamplerConfig::new()
        .with_draws(sampler.draws)
        .with_chains(sampler.chains)
        .with_tune(sampler.tune)
        .with_init(parse_init(&sampler.init)?)
        .with_cores(sampler.cores)
        .with_seed(seed.unwrap_or(sampler.seed))
        .with_min_acceptance(sampler.min_acceptance)
        .with_max_rhat(sampler.max_rhat);
    if let Some(w) = sampler.walkers {
        cfg = cfg.with_walkers(w);
    }
    cfg.validate().context("invalid [sampler] section")?;
    Ok(cfg)
}

/// Builds the counterfactual clamp for `variable`.
///
/// Physically non-negative variables must set `[bounds].lower`.
pub fn build_bounds(bounds: &BoundsToml, variable: &str) -> Result<ValueBounds> {
    if bounds.lower.is_none() && BOUNDED_VARIABLES.contains(&variable) {
        bail!("variable {variable:?} is bounded: set [bounds].lower explicitly");
    }
    Ok(ValueBounds::new(bounds.lower, bounds.upper))
}

/// Builds a validated [`BatchConfig`] from the whole configuration.
pub fn build_batch_config(config: &CfactConfig) -> Result<BatchConfig> {
    let cfg = BatchConfig::new()
        .with_timeout_secs(config.batch.timeout_secs)
        .with_skip_if_exists(config.batch.skip_if_exists)
        .with_require_even_split(config.batch.require_even_split)
        .with_bounds(build_bounds(&config.bounds, &config.io.variable)?)
        .with_writer(build_writer_config(&config.io)?);
    cfg.validate().context("invalid [batch] settings")?;
    Ok(cfg)
}
