//! Error types for cfact-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the cfact-io crate.
///
/// Covers missing files and variables, format errors from NetCDF, Parquet
/// and Arrow, malformed artifacts, and grid mismatches.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error from the filesystem.
    #[error("i/o error on {}: {reason}", path.display())]
    Fs {
        /// Path being accessed.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Wraps an error originating from the Parquet or Arrow libraries.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying Parquet failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required variable is not present in a file.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a time axis cannot be read.
    #[error("invalid time: {reason}")]
    InvalidTime {
        /// Description of the time axis issue.
        reason: String,
    },

    /// Returned when a Parquet artifact lacks its layout metadata or has a
    /// layout the reader cannot use.
    #[error("malformed artifact {}: {reason}", path.display())]
    MalformedArtifact {
        /// Path of the artifact.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

impl IoError {
    pub(crate) fn fs(path: &std::path::Path, e: std::io::Error) -> Self {
        IoError::Fs {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }

    pub(crate) fn malformed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        IoError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}
