//! Error types for cfact-stats.

/// Errors raised by scaling and interpolation helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// The reference series has no finite value to take a range from.
    #[error("reference series has no finite values")]
    NoFiniteValues,

    /// The reference series is constant, so its range is zero.
    #[error("reference series is constant (min == max == {value})")]
    ConstantReference {
        /// The single value the reference takes.
        value: f64,
    },

    /// Two paired inputs have different lengths.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// An input that must contain data is empty.
    #[error("{name} must not be empty")]
    Empty {
        /// Name of the offending input.
        name: &'static str,
    },
}
