//! The log-density capability a sampler draws from.

/// How a parameter block maps from the sampler's unconstrained space to its
/// natural support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// The block is sampled on its natural scale.
    Identity,
    /// The block is sampled as `ln(x)` and reported as `x = exp(.)`.
    Log,
}

impl Transform {
    /// Maps an unconstrained value onto the block's support.
    #[inline]
    pub fn constrain(self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Log => x.exp(),
        }
    }

    /// Inverse of [`Transform::constrain`].
    #[inline]
    pub fn unconstrain(self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Log => x.ln(),
        }
    }

    /// Short tag used when a layout is persisted.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Log => "log",
        }
    }

    /// Parses a tag written by [`Transform::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "identity" => Some(Self::Identity),
            "log" => Some(Self::Log),
            _ => None,
        }
    }
}

/// A named, contiguous block of parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBlock {
    name: String,
    len: usize,
    transform: Transform,
}

impl ParamBlock {
    /// A block of `len` parameters sampled under `transform`.
    pub fn new(name: impl Into<String>, len: usize, transform: Transform) -> Self {
        Self {
            name: name.into(),
            len,
            transform,
        }
    }

    /// A single unconstrained parameter.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, 1, Transform::Identity)
    }

    /// A single strictly positive parameter, sampled on the log scale.
    pub fn positive(name: impl Into<String>) -> Self {
        Self::new(name, 1, Transform::Log)
    }

    /// A vector of `len` unconstrained parameters.
    pub fn vector(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, len, Transform::Identity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Flat column names: `name` for scalars, `name__i` for vector entries.
    pub fn column_names(&self) -> Vec<String> {
        if self.len == 1 {
            vec![self.name.clone()]
        } else {
            (0..self.len).map(|i| format!("{}__{i}", self.name)).collect()
        }
    }
}

/// A continuous target distribution over `dim()` unconstrained reals.
///
/// Implementors return the log posterior density up to an additive constant,
/// including the log-Jacobian of any block [`Transform`]. Positions the
/// density cannot support return `f64::NEG_INFINITY`.
pub trait LogDensity: Sync {
    /// Parameter layout, in the order positions are laid out.
    fn blocks(&self) -> &[ParamBlock];

    /// Log density at `theta` (unconstrained space).
    fn log_density(&self, theta: &[f64]) -> f64;

    /// A point with finite density near the bulk of the prior.
    fn initial_point(&self) -> Vec<f64>;

    /// A data-driven point estimate, if the target can produce one cheaply.
    fn point_estimate(&self) -> Option<Vec<f64>> {
        None
    }

    /// Total number of unconstrained coordinates.
    fn dim(&self) -> usize {
        self.blocks().iter().map(ParamBlock::len).sum()
    }
}

/// Total width of a block layout.
pub fn layout_width(blocks: &[ParamBlock]) -> usize {
    blocks.iter().map(ParamBlock::len).sum()
}
