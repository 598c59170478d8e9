//! Posterior draws laid out by parameter block.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis, s};

use crate::error::SamplerError;
use crate::target::{ParamBlock, layout_width};

/// Posterior draws on the constrained scale.
///
/// Draws are stored as a `(chains * draws_per_chain) x width` matrix, chain
/// by chain. Column order follows the block layout, so block `b` occupies a
/// contiguous column range.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    blocks: Vec<ParamBlock>,
    chains: usize,
    draws_per_chain: usize,
    values: Array2<f64>,
}

impl Trace {
    /// Assembles a trace from a block layout and a draw matrix.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::ShapeMismatch`] if `values` is not
    /// `(chains * draws_per_chain) x width(blocks)`.
    pub fn new(
        blocks: Vec<ParamBlock>,
        chains: usize,
        draws_per_chain: usize,
        values: Array2<f64>,
    ) -> Result<Self, SamplerError> {
        let expected = (chains * draws_per_chain, layout_width(&blocks));
        if values.dim() != expected {
            return Err(SamplerError::ShapeMismatch {
                expected: format!("{expected:?}"),
                got: format!("{:?}", values.dim()),
            });
        }
        Ok(Self {
            blocks,
            chains,
            draws_per_chain,
            values,
        })
    }

    pub fn blocks(&self) -> &[ParamBlock] {
        &self.blocks
    }

    pub fn chains(&self) -> usize {
        self.chains
    }

    pub fn draws_per_chain(&self) -> usize {
        self.draws_per_chain
    }

    /// Total number of draws over all chains.
    pub fn n_draws(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// The full draw matrix.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Flat column names in storage order.
    pub fn column_names(&self) -> Vec<String> {
        self.blocks.iter().flat_map(ParamBlock::column_names).collect()
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.blocks.iter().any(|b| b.name() == name)
    }

    /// Checks that every name in `required` is a block of this trace.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::MissingParameter`] for the first absent name.
    pub fn require(&self, required: &[&str]) -> Result<(), SamplerError> {
        match required.iter().find(|n| !self.has_param(n)) {
            Some(name) => Err(SamplerError::MissingParameter {
                name: (*name).to_string(),
            }),
            None => Ok(()),
        }
    }

    fn column_range(&self, name: &str) -> Option<(usize, usize)> {
        let mut start = 0;
        for b in &self.blocks {
            if b.name() == name {
                return Some((start, start + b.len()));
            }
            start += b.len();
        }
        None
    }

    /// Draws of block `name` as a `n_draws x len` view.
    pub fn param(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        let (lo, hi) = self.column_range(name)?;
        Some(self.values.slice(s![.., lo..hi]))
    }

    /// Draws of the first entry of block `name`.
    pub fn scalar(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let (lo, _) = self.column_range(name)?;
        Some(self.values.column(lo))
    }

    /// Posterior mean of each entry of block `name`.
    pub fn param_mean(&self, name: &str) -> Option<Vec<f64>> {
        let view = self.param(name)?;
        if view.nrows() == 0 {
            return None;
        }
        view.mean_axis(Axis(0)).map(|m| m.to_vec())
    }

    /// Draws belonging to chain `chain`.
    pub fn chain(&self, chain: usize) -> ArrayView2<'_, f64> {
        let lo = chain * self.draws_per_chain;
        self.values.slice(s![lo..lo + self.draws_per_chain, ..])
    }
}
