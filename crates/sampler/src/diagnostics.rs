//! Convergence diagnostics over a multi-chain trace.

use cfact_stats::{mean, variance};

use crate::trace::Trace;

/// Gelman-Rubin potential scale reduction factor for one scalar quantity.
///
/// `chains` holds the draws of each chain; all chains must have the same
/// length. Returns `None` with fewer than two chains, fewer than two draws per
/// chain, or zero within-chain variance.
pub fn rhat(chains: &[Vec<f64>]) -> Option<f64> {
    let m = chains.len();
    if m < 2 {
        return None;
    }
    let n = chains[0].len();
    if n < 2 || chains.iter().any(|c| c.len() != n) {
        return None;
    }

    let means: Vec<f64> = chains.iter().map(|c| mean(c)).collect();
    let w = chains.iter().map(|c| variance(c)).sum::<f64>() / m as f64;
    if w <= 0.0 {
        return None;
    }
    let b = n as f64 * variance(&means);
    let nf = n as f64;
    let var_hat = (nf - 1.0) / nf * w + b / nf;
    Some((var_hat / w).sqrt())
}

/// Per-column R-hat and per-chain acceptance for one sampling run.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    rhat: Vec<(String, Option<f64>)>,
    acceptance: Vec<f64>,
}

impl Diagnostics {
    /// Computes R-hat for every column of `trace`.
    pub fn compute(trace: &Trace, acceptance: Vec<f64>) -> Self {
        let names = trace.column_names();
        let rhat = names
            .into_iter()
            .enumerate()
            .map(|(j, name)| {
                let per_chain: Vec<Vec<f64>> = (0..trace.chains())
                    .map(|c| trace.chain(c).column(j).to_vec())
                    .collect();
                (name, rhat(&per_chain))
            })
            .collect();
        Self { rhat, acceptance }
    }

    /// R-hat per flat column name.
    pub fn rhat(&self) -> &[(String, Option<f64>)] {
        &self.rhat
    }

    /// Acceptance fraction per chain.
    pub fn acceptance(&self) -> &[f64] {
        &self.acceptance
    }

    /// Column with the largest defined R-hat.
    pub fn worst_rhat(&self) -> Option<(&str, f64)> {
        self.rhat
            .iter()
            .filter_map(|(n, r)| r.map(|r| (n.as_str(), r)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Lowest per-chain acceptance, with its chain index.
    pub fn min_acceptance(&self) -> Option<(usize, f64)> {
        self.acceptance
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
