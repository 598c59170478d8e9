//! Batch error types.
//!
//! [`BatchError`] aborts a worker; [`CellError`] is logged against one cell
//! and the worker moves on.

use cfact_io::IoError;
use cfact_model::ModelError;
use cfact_sampler::SamplerError;

/// Errors that stop a whole worker.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A configuration problem detected before or during the run.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The inputs cannot be used for any cell.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A result could not be written.
    #[error("failed to persist {what}: {source}")]
    Persist {
        what: &'static str,
        #[source]
        source: IoError,
    },

    /// The run summary could not be serialised.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

/// Errors confined to one cell.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CellError {
    /// The cell's data cannot support the model.
    #[error("degenerate cell: {reason}")]
    Degenerate { reason: String },

    /// Sampling failed numerically or did not converge.
    #[error("sampling failed: {reason}")]
    Sampling { reason: String },

    /// The per-cell wall-clock budget ran out.
    #[error("timed out after {elapsed_secs:.1}s")]
    Timeout { elapsed_secs: f64 },

    /// The fitted draws could not be turned into a counterfactual.
    #[error("reconstruction failed: {reason}")]
    Reconstruction { reason: String },
}

impl CellError {
    /// Short machine-readable category for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Degenerate { .. } => "degenerate",
            Self::Sampling { .. } => "sampling",
            Self::Timeout { .. } => "timeout",
            Self::Reconstruction { .. } => "reconstruction",
        }
    }
}

/// Routes a model error: configuration and regressor problems abort the
/// run, everything else is confined to the cell.
pub(crate) fn classify_model(e: ModelError) -> Result<CellError, BatchError> {
    if e.is_fatal() {
        return Err(BatchError::InvalidConfig {
            reason: e.to_string(),
        });
    }
    Ok(match e {
        ModelError::Degenerate { reason } => CellError::Degenerate { reason },
        ModelError::IncompatibleTrace { reason } => CellError::Reconstruction { reason },
        other => CellError::Degenerate {
            reason: other.to_string(),
        },
    })
}

/// Routes a sampler error: an invalid configuration aborts the run.
pub(crate) fn classify_sampler(e: SamplerError) -> Result<CellError, BatchError> {
    if e.is_fatal() {
        return Err(BatchError::InvalidConfig {
            reason: e.to_string(),
        });
    }
    Ok(match e {
        SamplerError::Timeout { elapsed_secs, .. } => CellError::Timeout { elapsed_secs },
        other => CellError::Sampling {
            reason: other.to_string(),
        },
    })
}
