//! Ensemble MCMC backed by the `emcee` crate.
//!
//! Each chain is an independent `emcee` ensemble seeded from the sampler
//! seed and the chain index. Walkers start jittered around a centre point
//! chosen by [`InitStrategy`](crate::InitStrategy). The ensemble advances in
//! short segments so the wall-clock deadline is checked between them. After
//! `tune` iterations the walker positions of every iteration are recorded
//! until `draws` are collected.

use emcee::{EnsembleSampler as Emcee, Guess, Prob};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::SamplerConfig;
use crate::deadline::Deadline;
use crate::diagnostics::Diagnostics;
use crate::error::SamplerError;
use crate::init;
use crate::sampler::Sampler;
use crate::target::{LogDensity, ParamBlock};
use crate::trace::Trace;

/// Attempts at re-drawing a walker whose jittered start has no support.
const MAX_INIT_ATTEMPTS: usize = 100;

/// Iterations per `emcee` call; the deadline is checked between calls.
const SEGMENT_ITERS: usize = 25;

/// Output of one chain: constrained draws (row-major) and acceptance.
struct ChainRun {
    draws: Vec<f64>,
    acceptance: f64,
}

/// Exposes a [`LogDensity`] to `emcee`, which works in `f32`.
struct Posterior<'t> {
    target: &'t dyn LogDensity,
}

impl Prob for Posterior<'_> {
    fn lnlike(&self, params: &Guess) -> f32 {
        let theta: Vec<f64> = params.values.iter().map(|&v| f64::from(v)).collect();
        self.target.log_density(&theta) as f32
    }

    // Priors are part of the target density.
    fn lnprior(&self, _params: &Guess) -> f32 {
        0.0
    }
}

/// Ensemble MCMC over any [`LogDensity`], one ensemble per chain, chains in
/// parallel on a rayon pool owned by the sampler.
#[derive(Debug)]
pub struct EnsembleSampler {
    config: SamplerConfig,
    pool: ThreadPool,
}

impl EnsembleSampler {
    /// Builds a sampler after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidConfig`] if the configuration is invalid
    /// or the worker pool cannot be started.
    pub fn new(config: SamplerConfig) -> Result<Self, SamplerError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.cores())
            .build()
            .map_err(|e| SamplerError::InvalidConfig {
                reason: format!("failed to build thread pool: {e}"),
            })?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples and also returns the convergence diagnostics of the run.
    ///
    /// # Errors
    ///
    /// See [`Sampler::sample`].
    pub fn sample_with_diagnostics(
        &self,
        target: &dyn LogDensity,
        deadline: &Deadline,
    ) -> Result<(Trace, Diagnostics), SamplerError> {
        let cfg = &self.config;
        let dim = target.dim();
        if dim == 0 {
            return Err(SamplerError::InvalidConfig {
                reason: "target has no parameters".to_string(),
            });
        }
        let walkers = cfg.walkers_for(dim);
        if walkers <= 2 * dim {
            return Err(SamplerError::InvalidConfig {
                reason: format!(
                    "{walkers} walkers for {dim} parameters, need more than {}",
                    2 * dim
                ),
            });
        }

        let centre = init::centre_point(target, cfg);
        if !target.log_density(&centre).is_finite() {
            return Err(SamplerError::NonFiniteLogDensity {
                context: "initial point".to_string(),
            });
        }
        deadline.check()?;

        let runs: Vec<ChainRun> = self.pool.install(|| {
            (0..cfg.chains())
                .into_par_iter()
                .map(|chain| run_chain(target, cfg, &centre, walkers, chain, deadline))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let width = dim;
        let mut flat = Vec::with_capacity(cfg.chains() * cfg.draws() * width);
        let mut acceptance = Vec::with_capacity(runs.len());
        for run in runs {
            flat.extend(run.draws);
            acceptance.push(run.acceptance);
        }
        let values = Array2::from_shape_vec((cfg.chains() * cfg.draws(), width), flat).map_err(
            |e| SamplerError::ShapeMismatch {
                expected: format!("({}, {width})", cfg.chains() * cfg.draws()),
                got: e.to_string(),
            },
        )?;
        let trace = Trace::new(target.blocks().to_vec(), cfg.chains(), cfg.draws(), values)?;

        let diagnostics = Diagnostics::compute(&trace, acceptance);
        self.check(&diagnostics)?;
        Ok((trace, diagnostics))
    }

    fn check(&self, diagnostics: &Diagnostics) -> Result<(), SamplerError> {
        let cfg = &self.config;
        if let Some((chain, acceptance)) = diagnostics.min_acceptance()
            && acceptance < cfg.min_acceptance()
        {
            return Err(SamplerError::Stuck {
                chain,
                acceptance,
                min: cfg.min_acceptance(),
            });
        }
        if let Some((param, rhat)) = diagnostics.worst_rhat() {
            match cfg.max_rhat() {
                Some(max) if rhat > max => {
                    return Err(SamplerError::NotConverged {
                        param: param.to_string(),
                        rhat,
                        max,
                    });
                }
                _ if rhat > 1.1 => warn!(param, rhat, "chains have not mixed well"),
                _ => debug!(param, rhat, "worst r-hat"),
            }
        }
        info!(
            acceptance = ?diagnostics.acceptance(),
            "sampling finished"
        );
        Ok(())
    }
}

impl Sampler for EnsembleSampler {
    fn sample(&self, target: &dyn LogDensity, deadline: &Deadline) -> Result<Trace, SamplerError> {
        self.sample_with_diagnostics(target, deadline)
            .map(|(trace, _)| trace)
    }
}

/// Runs one chain's ensemble through tuning and collection.
fn run_chain(
    target: &dyn LogDensity,
    cfg: &SamplerConfig,
    centre: &[f64],
    walkers: usize,
    chain: usize,
    deadline: &Deadline,
) -> Result<ChainRun, SamplerError> {
    let dim = centre.len();
    let mut rng = StdRng::seed_from_u64(cfg.seed().wrapping_add(chain as u64));

    // -- Ensemble start ------------------------------------------------------

    let mut current: Vec<Vec<f32>> = Vec::with_capacity(walkers);
    for _ in 0..walkers {
        let p = jittered_start(target, centre, cfg.init_jitter(), &mut rng)?;
        current.push(p.iter().map(|&v| v as f32).collect());
    }

    let posterior = Posterior { target };
    let mut ensemble = Emcee::new(walkers, dim, &posterior).map_err(|e| {
        SamplerError::InvalidConfig {
            reason: format!("ensemble rejected: {e}"),
        }
    })?;
    ensemble.seed(&[cfg.seed() as usize, chain]);

    // -- Iterate -------------------------------------------------------------

    let blocks = target.blocks();
    let collect_iters = cfg.draws().div_ceil(walkers);
    let total_iters = cfg.tune() + collect_iters;

    let mut draws: Vec<f64> = Vec::with_capacity(cfg.draws() * dim);
    let mut kept = 0usize;
    let mut accepted = 0usize;
    let mut proposed = 0usize;
    let mut iter = 0usize;

    while iter < total_iters {
        deadline.check()?;
        let steps = SEGMENT_ITERS.min(total_iters - iter);
        let start: Vec<Guess> = current.iter().map(|v| Guess::new(v)).collect();
        ensemble
            .sample(&start, steps, |step| {
                let collecting = iter >= cfg.tune();
                for (k, walker) in step.pos.iter().enumerate() {
                    if collecting {
                        proposed += 1;
                        if walker.values != current[k] {
                            accepted += 1;
                        }
                        if kept < cfg.draws() {
                            push_constrained(&mut draws, blocks, &walker.values);
                            kept += 1;
                        }
                    }
                    current[k].clone_from(&walker.values);
                }
                iter += 1;
            })
            .map_err(|e| SamplerError::NonFiniteLogDensity {
                context: format!("ensemble step in chain {chain}: {e}"),
            })?;
    }

    let acceptance = if proposed == 0 {
        0.0
    } else {
        accepted as f64 / proposed as f64
    };
    debug!(chain, walkers, acceptance, "chain finished");
    Ok(ChainRun { draws, acceptance })
}

/// Draws a walker around `centre` until it lands where the density is finite.
fn jittered_start(
    target: &dyn LogDensity,
    centre: &[f64],
    sd: f64,
    rng: &mut StdRng,
) -> Result<Vec<f64>, SamplerError> {
    for _ in 0..MAX_INIT_ATTEMPTS {
        let p: Vec<f64> = centre
            .iter()
            .map(|&c| {
                let e: f64 = rng.sample(StandardNormal);
                c + sd * e
            })
            .collect();
        if target.log_density(&p).is_finite() {
            return Ok(p);
        }
    }
    Err(SamplerError::NonFiniteLogDensity {
        context: "jittered walker start".to_string(),
    })
}

/// Appends the constrained values of an unconstrained walker position.
fn push_constrained(out: &mut Vec<f64>, blocks: &[ParamBlock], position: &[f32]) {
    let mut i = 0;
    for b in blocks {
        for _ in 0..b.len() {
            out.push(b.transform().constrain(f64::from(position[i])));
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    use crate::config::InitStrategy;

    /// Independent normals: `x ~ N(mu_x, 1)` and `s ~ LogNormal(0, 0.5)`
    /// sampled as `ln s`.
    struct Toy {
        blocks: Vec<ParamBlock>,
        mu: f64,
    }

    impl Toy {
        fn new(mu: f64) -> Self {
            Self {
                blocks: vec![ParamBlock::scalar("x"), ParamBlock::positive("s")],
                mu,
            }
        }
    }

    impl LogDensity for Toy {
        fn blocks(&self) -> &[ParamBlock] {
            &self.blocks
        }
        fn log_density(&self, theta: &[f64]) -> f64 {
            let x = theta[0];
            let ln_s = theta[1];
            -0.5 * (x - self.mu).powi(2) - 0.5 * (ln_s / 0.5).powi(2)
        }
        fn initial_point(&self) -> Vec<f64> {
            vec![0.0, 0.0]
        }
    }

    struct Nowhere {
        blocks: Vec<ParamBlock>,
    }

    impl LogDensity for Nowhere {
        fn blocks(&self) -> &[ParamBlock] {
            &self.blocks
        }
        fn log_density(&self, _theta: &[f64]) -> f64 {
            f64::NEG_INFINITY
        }
        fn initial_point(&self) -> Vec<f64> {
            vec![0.0]
        }
    }

    fn config() -> SamplerConfig {
        SamplerConfig::new()
            .with_draws(2000)
            .with_chains(2)
            .with_tune(300)
            .with_init(InitStrategy::Jitter)
            .with_seed(7)
    }

    #[test]
    fn recovers_moments_and_constrains_positive_block() {
        let sampler = EnsembleSampler::new(config().with_cores(2)).unwrap();
        let (trace, diag) = sampler
            .sample_with_diagnostics(&Toy::new(3.0), &Deadline::unlimited())
            .unwrap();

        assert_eq!(trace.n_draws(), 4000);
        assert_eq!(trace.chains(), 2);
        let x_mean = trace.param_mean("x").unwrap()[0];
        assert_relative_eq!(x_mean, 3.0, epsilon = 0.2);
        assert!(trace.scalar("s").unwrap().iter().all(|&s| s > 0.0));
        assert!(diag.acceptance().iter().all(|&a| a > 0.2));
    }

    #[test]
    fn same_seed_is_deterministic() {
        let sampler = EnsembleSampler::new(config().with_draws(100).with_tune(20)).unwrap();
        let a = sampler.sample(&Toy::new(0.0), &Deadline::unlimited()).unwrap();
        let b = sampler.sample(&Toy::new(0.0), &Deadline::unlimited()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn one_sampler_serves_many_targets() {
        let sampler = EnsembleSampler::new(config().with_draws(200).with_tune(50)).unwrap();
        for mu in [-1.0, 0.0, 2.0] {
            let trace = sampler.sample(&Toy::new(mu), &Deadline::unlimited()).unwrap();
            assert_eq!(trace.n_draws(), 400);
            assert_relative_eq!(trace.param_mean("x").unwrap()[0], mu, epsilon = 0.5);
        }
    }

    #[test]
    fn too_few_walkers_rejected() {
        let sampler = EnsembleSampler::new(config().with_walkers(4)).unwrap();
        let err = sampler.sample(&Toy::new(0.0), &Deadline::unlimited()).unwrap_err();
        assert!(matches!(err, SamplerError::InvalidConfig { .. }));
    }

    #[test]
    fn draws_not_multiple_of_walkers_truncate() {
        let sampler = EnsembleSampler::new(config().with_draws(37).with_tune(5)).unwrap();
        let trace = sampler.sample(&Toy::new(0.0), &Deadline::unlimited()).unwrap();
        assert_eq!(trace.draws_per_chain(), 37);
        assert_eq!(trace.n_draws(), 74);
    }

    #[test]
    fn expired_deadline_times_out() {
        let sampler = EnsembleSampler::new(config()).unwrap();
        let err = sampler
            .sample(&Toy::new(0.0), &Deadline::new(Some(Duration::ZERO)))
            .unwrap_err();
        assert!(matches!(err, SamplerError::Timeout { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn unsupported_start_is_reported() {
        let sampler = EnsembleSampler::new(config()).unwrap();
        let target = Nowhere {
            blocks: vec![ParamBlock::scalar("x")],
        };
        let err = sampler.sample(&target, &Deadline::unlimited()).unwrap_err();
        assert!(matches!(err, SamplerError::NonFiniteLogDensity { .. }));
    }

    #[test]
    fn invalid_config_rejected_up_front() {
        let err = EnsembleSampler::new(config().with_draws(0)).unwrap_err();
        assert!(err.is_fatal());
    }
}
