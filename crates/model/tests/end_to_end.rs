//! Fit the detrending model to synthetic data with a known linear trend and
//! check the counterfactual removes it.

use chrono::{NaiveDate, TimeDelta};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use cfact_model::{DetrendModel, ModelConfig, Reconstruction, RegressionFrame, SLOPE, ValueBounds};
use cfact_sampler::{Deadline, EnsembleSampler, InitStrategy, LogDensity, Sampler, SamplerConfig};

const N_DAYS: i64 = 731;

fn synthetic() -> (Vec<NaiveDate>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 0.01).unwrap();
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..N_DAYS).map(|i| start + TimeDelta::days(i)).collect();
    let t: Vec<f64> = (0..N_DAYS).map(|i| i as f64 / (N_DAYS - 1) as f64).collect();
    let y: Vec<f64> = t
        .iter()
        .map(|ti| 10.0 + 0.5 * ti + noise.sample(&mut rng))
        .collect();
    let reference: Vec<f64> = y.iter().zip(&t).map(|(yi, ti)| yi - 0.5 * ti).collect();
    // GMT equal to scaled time.
    (dates, y, t, reference)
}

fn sampler(init: InitStrategy) -> EnsembleSampler {
    let cfg = SamplerConfig::new()
        .with_draws(400)
        .with_chains(2)
        .with_tune(400)
        .with_init(init)
        .with_cores(2)
        .with_seed(11);
    EnsembleSampler::new(cfg).unwrap()
}

#[test]
fn counterfactual_removes_known_trend() {
    let (dates, y, gmt, reference) = synthetic();
    let frame = RegressionFrame::from_dates(dates, &y, &gmt).unwrap();
    let model = DetrendModel::new(&frame, &ModelConfig::new().with_modes(1)).unwrap();

    let trace = sampler(InitStrategy::LeastSquares)
        .sample(&model, &Deadline::unlimited())
        .unwrap();
    assert_eq!(trace.n_draws(), 800);

    let slope = trace.param_mean(SLOPE).unwrap()[0];
    assert!(slope > 0.0, "slope {slope}");

    let recon = Reconstruction::new(&trace, model.basis(), frame).unwrap();
    assert_eq!(recon.cfact()[0], y[0]);

    let mad = cfact_stats::mean_abs_diff(recon.cfact(), &reference).unwrap();
    assert!(mad < 0.1, "mean absolute deviation {mad}");
}

#[test]
fn map_initialisation_reaches_same_answer() {
    let (dates, y, gmt, reference) = synthetic();
    let frame = RegressionFrame::from_dates(dates, &y, &gmt).unwrap();
    let model = DetrendModel::new(&frame, &ModelConfig::new().with_modes(1)).unwrap();
    assert!(model.log_density(&model.initial_point()).is_finite());

    let trace = sampler(InitStrategy::Map)
        .sample(&model, &Deadline::unlimited())
        .unwrap();
    let recon = Reconstruction::new(&trace, model.basis(), frame)
        .unwrap()
        .with_bounds(&ValueBounds::new(Some(0.0), None));

    let mad = cfact_stats::mean_abs_diff(recon.cfact(), &reference).unwrap();
    assert!(mad < 0.1, "mean absolute deviation {mad}");
}
