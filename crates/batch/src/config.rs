//! Worker configuration.

use std::time::Duration;

use cfact_io::WriterConfig;
use cfact_model::ValueBounds;

use crate::error::BatchError;

/// Behaviour of one worker over its partition.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Wall-clock budget per cell; `None` for no limit.
    timeout: Option<Duration>,
    /// Skip cells whose output already validates.
    skip_if_exists: bool,
    /// Reject partitions that do not divide the cell count.
    require_even_split: bool,
    /// Clamp applied to each counterfactual.
    bounds: ValueBounds,
    /// Parquet settings for traces and outputs.
    writer: WriterConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            skip_if_exists: true,
            require_even_split: false,
            bounds: ValueBounds::none(),
            writer: WriterConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout = secs.map(Duration::from_secs);
        self
    }

    pub fn with_skip_if_exists(mut self, skip: bool) -> Self {
        self.skip_if_exists = skip;
        self
    }

    pub fn with_require_even_split(mut self, require: bool) -> Self {
        self.require_even_split = require;
        self
    }

    pub fn with_bounds(mut self, bounds: ValueBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn skip_if_exists(&self) -> bool {
        self.skip_if_exists
    }

    pub fn require_even_split(&self) -> bool {
        self.require_even_split
    }

    pub fn bounds(&self) -> &ValueBounds {
        &self.bounds
    }

    pub fn writer(&self) -> &WriterConfig {
        &self.writer
    }

    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] for a zero timeout, inverted or
    /// non-finite bounds, or an invalid writer configuration.
    pub fn validate(&self) -> Result<(), BatchError> {
        let invalid = |reason: String| Err(BatchError::InvalidConfig { reason });
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return invalid("timeout_secs must be greater than 0".to_string());
        }
        let (lo, hi) = (self.bounds.lower(), self.bounds.upper());
        if lo.is_some_and(|v| !v.is_finite()) || hi.is_some_and(|v| !v.is_finite()) {
            return invalid("bounds must be finite".to_string());
        }
        if let (Some(lo), Some(hi)) = (lo, hi)
            && lo > hi
        {
            return invalid(format!("lower bound {lo} exceeds upper bound {hi}"));
        }
        self.writer
            .validate()
            .map_err(|e| BatchError::InvalidConfig {
                reason: e.to_string(),
            })
    }
}
