//! Integration tests: sampling a small linear-regression posterior through
//! the public capability interface.

use std::time::Duration;

use approx::assert_relative_eq;

use cfact_sampler::{
    Deadline, EnsembleSampler, InitStrategy, LogDensity, ParamBlock, Sampler, SamplerConfig,
    SamplerError,
};

/// `y = a + b x + e`, `e ~ N(0, 0.5^2)`, with a wide normal prior on `(a, b)`.
struct Line {
    blocks: Vec<ParamBlock>,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Line {
    fn new() -> Self {
        let x: Vec<f64> = (0..80).map(|i| i as f64 / 80.0).collect();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, &x)| 1.0 + 2.0 * x + 0.3 * (i as f64 * 1.7).sin())
            .collect();
        Self {
            blocks: vec![ParamBlock::vector("beta", 2)],
            x,
            y,
        }
    }

    fn ols(&self) -> [f64; 2] {
        let n = self.x.len() as f64;
        let mx = self.x.iter().sum::<f64>() / n;
        let my = self.y.iter().sum::<f64>() / n;
        let sxy: f64 = self.x.iter().zip(&self.y).map(|(x, y)| (x - mx) * (y - my)).sum();
        let sxx: f64 = self.x.iter().map(|x| (x - mx).powi(2)).sum();
        let b = sxy / sxx;
        [my - b * mx, b]
    }
}

impl LogDensity for Line {
    fn blocks(&self) -> &[ParamBlock] {
        &self.blocks
    }

    fn log_density(&self, theta: &[f64]) -> f64 {
        let prior = -(theta[0].powi(2) + theta[1].powi(2)) / (2.0 * 100.0);
        let rss: f64 = self
            .x
            .iter()
            .zip(&self.y)
            .map(|(x, y)| (y - theta[0] - theta[1] * x).powi(2))
            .sum();
        prior - rss / (2.0 * 0.25)
    }

    fn initial_point(&self) -> Vec<f64> {
        vec![0.0, 0.0]
    }

    fn point_estimate(&self) -> Option<Vec<f64>> {
        Some(self.ols().to_vec())
    }
}

fn config(init: InitStrategy) -> SamplerConfig {
    SamplerConfig::new()
        .with_draws(1500)
        .with_tune(400)
        .with_chains(3)
        .with_cores(2)
        .with_init(init)
        .with_seed(11)
        .with_max_rhat(Some(1.2))
}

#[test]
fn posterior_mean_matches_least_squares() {
    let target = Line::new();
    let [a, b] = target.ols();
    for init in [InitStrategy::Jitter, InitStrategy::LeastSquares, InitStrategy::Map] {
        let sampler = EnsembleSampler::new(config(init)).unwrap();
        let (trace, diag) = sampler
            .sample_with_diagnostics(&target, &Deadline::unlimited())
            .unwrap();
        let mean = trace.param_mean("beta").unwrap();
        assert_relative_eq!(mean[0], a, epsilon = 0.1);
        assert_relative_eq!(mean[1], b, epsilon = 0.15);
        assert!(diag.worst_rhat().is_some_and(|(_, r)| r < 1.2));
        assert_eq!(diag.acceptance().len(), 3);
    }
}

#[test]
fn trait_object_sampling() {
    let target = Line::new();
    let sampler = EnsembleSampler::new(config(InitStrategy::LeastSquares)).unwrap();
    let dynamic: &dyn Sampler = &sampler;
    let trace = dynamic.sample(&target, &Deadline::unlimited()).unwrap();
    assert_eq!(trace.n_draws(), 4500);
    assert_eq!(trace.column_names(), vec!["beta__0", "beta__1"]);
    assert_eq!(trace.chain(2).nrows(), 1500);
}

#[test]
fn zero_budget_times_out() {
    let target = Line::new();
    let sampler = EnsembleSampler::new(config(InitStrategy::Jitter)).unwrap();
    let deadline = Deadline::new(Some(Duration::ZERO));
    std::thread::sleep(Duration::from_millis(2));
    let err = sampler.sample(&target, &deadline).unwrap_err();
    assert!(matches!(err, SamplerError::Timeout { .. }), "{err}");
    assert!(!err.is_fatal());
}
