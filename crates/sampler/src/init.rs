//! Choosing the centre point that chain ensembles are jittered around.
//!
//! The `Map` strategy wraps the `argmin` crate to minimise the negative log
//! density with Nelder-Mead, starting from the target's point estimate.

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use tracing::{debug, warn};

use crate::config::{InitStrategy, SamplerConfig};
use crate::target::LogDensity;

/// Centre point for the configured strategy, in unconstrained space.
pub(crate) fn centre_point(target: &dyn LogDensity, config: &SamplerConfig) -> Vec<f64> {
    match config.init() {
        InitStrategy::Jitter => target.initial_point(),
        InitStrategy::LeastSquares => estimate_or_prior(target),
        InitStrategy::Map => {
            let start = estimate_or_prior(target);
            match maximise(target, &start, config.map_max_iters()) {
                Some(best) => best,
                None => {
                    warn!("MAP optimisation failed, using the point estimate");
                    start
                }
            }
        }
    }
}

fn estimate_or_prior(target: &dyn LogDensity) -> Vec<f64> {
    match target.point_estimate() {
        Some(p) if p.len() == target.dim() && p.iter().all(|v| v.is_finite()) => p,
        _ => {
            debug!("no usable point estimate, starting from the prior");
            target.initial_point()
        }
    }
}

/// Nelder-Mead maximisation of the log density from `start`.
fn maximise(target: &dyn LogDensity, start: &[f64], max_iters: u64) -> Option<Vec<f64>> {
    let dim = start.len();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(start.to_vec());
    for i in 0..dim {
        let mut vertex = start.to_vec();
        vertex[i] += if vertex[i].abs() > 1e-3 {
            0.05 * vertex[i]
        } else {
            0.01
        };
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex).with_sd_tolerance(1e-10).ok()?;
    let result = Executor::new(NegLogDensity { target }, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .ok()?;

    let best = result.state().best_param.clone()?;
    debug!(
        iters = result.state().iter,
        cost = result.state().best_cost,
        "MAP optimisation finished"
    );
    target.log_density(&best).is_finite().then_some(best)
}

/// Cost function for argmin: negative log density.
struct NegLogDensity<'a> {
    target: &'a dyn LogDensity,
}

impl CostFunction for NegLogDensity<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let lp = self.target.log_density(params);
        if lp.is_finite() { Ok(-lp) } else { Ok(f64::MAX) }
    }
}
