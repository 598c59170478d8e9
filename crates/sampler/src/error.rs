//! Error types for cfact-sampler.

/// Errors that can occur while configuring or running a sampler, or while
/// assembling a [`Trace`](crate::Trace).
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// The sampler configuration is unusable.
    #[error("invalid sampler configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The log density was not finite where a finite value is required.
    #[error("non-finite log density at {context}")]
    NonFiniteLogDensity {
        /// Where the evaluation failed (e.g. "initial point").
        context: String,
    },

    /// The wall-clock budget ran out before sampling finished.
    #[error("sampling timed out after {elapsed_secs:.1}s (limit {limit_secs:.1}s)")]
    Timeout {
        /// Seconds elapsed when the timeout was detected.
        elapsed_secs: f64,
        /// Configured limit in seconds.
        limit_secs: f64,
    },

    /// A chain accepted too few proposals to be trusted.
    #[error("chain {chain} stuck: acceptance {acceptance:.3} below {min:.3}")]
    Stuck {
        /// Index of the offending chain.
        chain: usize,
        /// Observed acceptance fraction.
        acceptance: f64,
        /// Configured minimum acceptance fraction.
        min: f64,
    },

    /// Chains disagree beyond the configured R-hat threshold.
    #[error("not converged: r-hat of '{param}' is {rhat:.3} (max {max:.3})")]
    NotConverged {
        /// Column name of the worst parameter.
        param: String,
        /// Its R-hat value.
        rhat: f64,
        /// Configured threshold.
        max: f64,
    },

    /// A required parameter is absent from a trace.
    #[error("trace is missing parameter '{name}'")]
    MissingParameter {
        /// Name of the missing parameter block.
        name: String,
    },

    /// Draw storage does not match the declared layout.
    #[error("trace shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Expected shape, formatted.
        expected: String,
        /// Actual shape, formatted.
        got: String,
    },
}

impl SamplerError {
    /// Whether the error invalidates every cell of a run rather than just
    /// the one being sampled.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
