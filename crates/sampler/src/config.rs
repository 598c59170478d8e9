//! Sampler configuration.

use crate::error::SamplerError;

/// How chain ensembles are placed before tuning starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitStrategy {
    /// Jitter around the target's prior-centred initial point.
    Jitter,
    /// Jitter around the target's point estimate (falls back to `Jitter`).
    #[default]
    LeastSquares,
    /// Jitter around a Nelder-Mead maximum of the log density.
    Map,
}

/// Configuration for [`EnsembleSampler`](crate::EnsembleSampler).
///
/// Use the builder methods (`with_*`) to override defaults.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Kept draws per chain.
    draws: usize,
    /// Number of independent chains.
    chains: usize,
    /// Discarded tuning iterations per chain.
    tune: usize,
    /// Walkers per chain ensemble; `None` derives it from the dimension.
    walkers: Option<usize>,
    /// Ensemble placement.
    init: InitStrategy,
    /// Standard deviation of the initial walker jitter.
    init_jitter: f64,
    /// Worker threads used for chains.
    cores: usize,
    /// Base RNG seed; chain `c` uses `seed + c`.
    seed: u64,
    /// Chains whose acceptance fraction falls below this are rejected.
    min_acceptance: f64,
    /// Reject runs whose worst R-hat exceeds this, when set.
    max_rhat: Option<f64>,
    /// Iteration cap for the `Map` initialiser.
    map_max_iters: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerConfig {
    /// Default sampler configuration.
    ///
    /// - `draws`: 1000
    /// - `chains`: 2
    /// - `tune`: 500
    /// - `walkers`: derived (`max(2 * dim + 2, 16)`, rounded up to even)
    /// - `init`: [`InitStrategy::LeastSquares`]
    /// - `init_jitter`: 1e-3
    /// - `cores`: 1
    /// - `seed`: 0
    /// - `min_acceptance`: 0.01
    /// - `max_rhat`: `None`
    /// - `map_max_iters`: 2000
    pub fn new() -> Self {
        Self {
            draws: 1000,
            chains: 2,
            tune: 500,
            walkers: None,
            init: InitStrategy::default(),
            init_jitter: 1e-3,
            cores: 1,
            seed: 0,
            min_acceptance: 0.01,
            max_rhat: None,
            map_max_iters: 2000,
        }
    }

    pub fn with_draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    pub fn with_chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    pub fn with_tune(mut self, tune: usize) -> Self {
        self.tune = tune;
        self
    }

    /// Fixes the ensemble size instead of deriving it from the dimension.
    pub fn with_walkers(mut self, walkers: usize) -> Self {
        self.walkers = Some(walkers);
        self
    }

    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    pub fn with_init_jitter(mut self, sd: f64) -> Self {
        self.init_jitter = sd;
        self
    }

    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_min_acceptance(mut self, min: f64) -> Self {
        self.min_acceptance = min;
        self
    }

    pub fn with_max_rhat(mut self, max: Option<f64>) -> Self {
        self.max_rhat = max;
        self
    }

    pub fn with_map_max_iters(mut self, iters: u64) -> Self {
        self.map_max_iters = iters;
        self
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn chains(&self) -> usize {
        self.chains
    }

    pub fn tune(&self) -> usize {
        self.tune
    }

    pub fn init(&self) -> InitStrategy {
        self.init
    }

    pub fn init_jitter(&self) -> f64 {
        self.init_jitter
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn min_acceptance(&self) -> f64 {
        self.min_acceptance
    }

    pub fn max_rhat(&self) -> Option<f64> {
        self.max_rhat
    }

    pub fn map_max_iters(&self) -> u64 {
        self.map_max_iters
    }

    /// Ensemble size for a target of dimension `dim`.
    pub fn walkers_for(&self, dim: usize) -> usize {
        let n = self.walkers.unwrap_or_else(|| (2 * dim + 2).max(16));
        n + n % 2
    }

    /// Validates that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), SamplerError> {
        let fail = |reason: String| Err(SamplerError::InvalidConfig { reason });
        if self.draws == 0 {
            return fail("draws must be > 0".to_string());
        }
        if self.chains == 0 {
            return fail("chains must be > 0".to_string());
        }
        if self.cores == 0 {
            return fail("cores must be > 0".to_string());
        }
        if !(self.init_jitter > 0.0) {
            return fail(format!("init_jitter must be > 0, got {}", self.init_jitter));
        }
        if !(0.0..1.0).contains(&self.min_acceptance) {
            return fail(format!(
                "min_acceptance must be in [0, 1), got {}",
                self.min_acceptance
            ));
        }
        if let Some(w) = self.walkers
            && w < 4
        {
            return fail(format!("walkers must be >= 4, got {w}"));
        }
        if let Some(r) = self.max_rhat
            && !(r > 1.0)
        {
            return fail(format!("max_rhat must be > 1, got {r}"));
        }
        Ok(())
    }
}
