//! Per-worker run summary.

use std::path::Path;

use serde::Serialize;

use crate::error::BatchError;

/// Counts of what happened to the cells of one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub task_id: usize,
    pub n_tasks: usize,
    /// Cells assigned to this worker.
    pub cells: usize,
    /// Cells whose output was written in this run.
    pub completed: usize,
    /// Of `completed`, cells whose trace came from an earlier run.
    pub resumed: usize,
    /// Cells skipped because a valid output already existed.
    pub cached: usize,
    /// Cells skipped because their data cannot support the model.
    pub skipped_degenerate: usize,
    /// Cells whose estimation failed or timed out.
    pub failed: usize,
    pub elapsed_secs: f64,
}

impl BatchSummary {
    /// Cells accounted for so far.
    pub fn processed(&self) -> usize {
        self.completed + self.cached + self.skipped_degenerate + self.failed
    }

    /// Serialises the summary as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Serialization`] if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, BatchError> {
        serde_json::to_string_pretty(self).map_err(|e| BatchError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Writes [`BatchSummary::to_json`] to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Serialization`] if encoding or writing fails.
    pub fn write_json(&self, path: &Path) -> Result<(), BatchError> {
        let json = self.to_json()?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)
        };
        write().map_err(|e| BatchError::Serialization {
            reason: format!("{}: {e}", path.display()),
        })
    }
}
