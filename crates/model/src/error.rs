//! Error types for cfact-model.

use cfact_stats::StatsError;

/// Errors raised while building a regression frame, a model, or a
/// reconstruction.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Model hyperparameters or mode count are unusable.
    #[error("invalid model configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The cell's data cannot support a fit (all missing, constant, ...).
    #[error("degenerate series: {reason}")]
    Degenerate {
        /// Why the series is unusable.
        reason: String,
    },

    /// The time axis cannot be decoded or is not ordered.
    #[error("invalid time axis: {reason}")]
    InvalidTime {
        /// Description of the time problem.
        reason: String,
    },

    /// Inputs that must be aligned have different lengths.
    #[error("length mismatch for {name}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Name of the misaligned input.
        name: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// The regressor series is unusable.
    #[error("invalid regressor: {reason}")]
    InvalidRegressor {
        /// What is wrong with the regressor.
        reason: String,
    },

    /// A trace does not fit the model it is being applied to.
    #[error("trace incompatible with model: {reason}")]
    IncompatibleTrace {
        /// Description of the mismatch.
        reason: String,
    },
}

impl ModelError {
    /// Whether the error must abort a whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::InvalidRegressor { .. }
        )
    }

    /// Whether the error marks a cell whose data cannot be fitted.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }
}

impl From<StatsError> for ModelError {
    fn from(e: StatsError) -> Self {
        match e {
            StatsError::LengthMismatch { expected, got } => ModelError::LengthMismatch {
                name: "series",
                expected,
                got,
            },
            other => ModelError::Degenerate {
                reason: other.to_string(),
            },
        }
    }
}
