//! Filesystem layout of per-cell artifacts.

use std::path::{Path, PathBuf};

use crate::grid::CellRecord;

/// Maps cells to artifact paths under one output root.
///
/// ```text
/// {root}/traces/{variable}/lat_{lat}/trace_{variable}_{dataset}_lat{lat}_lon{lon}.parquet
/// {root}/timeseries/{variable}/lat_{lat}/ts_{variable}_{dataset}_lat{lat}_lon{lon}.parquet
/// {root}/cfact/{variable}_{dataset}_cfact.nc
/// ```
///
/// Every artifact is keyed by variable, dataset and coordinate, so runs for
/// different variables can share a root. Each cell has a single writer, the
/// worker whose partition contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
    variable: String,
    dataset: String,
}

impl ArtifactStore {
    pub fn new(
        root: impl Into<PathBuf>,
        variable: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            variable: variable.into(),
            dataset: dataset.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn trace_path(&self, cell: &CellRecord) -> PathBuf {
        self.root
            .join("traces")
            .join(&self.variable)
            .join(format!("lat_{}", cell.lat))
            .join(format!(
                "trace_{}_{}_lat{}_lon{}.parquet",
                self.variable, self.dataset, cell.lat, cell.lon
            ))
    }

    /// Directory holding every per-cell output of this variable.
    pub fn timeseries_dir(&self) -> PathBuf {
        self.root.join("timeseries").join(&self.variable)
    }

    pub fn output_path(&self, cell: &CellRecord) -> PathBuf {
        self.timeseries_dir()
            .join(format!("lat_{}", cell.lat))
            .join(format!(
                "ts_{}_{}_lat{}_lon{}.parquet",
                self.variable, self.dataset, cell.lat, cell.lon
            ))
    }

    /// Whether a file under [`ArtifactStore::timeseries_dir`] is an output of
    /// this variable and dataset.
    pub fn is_output_file(&self, path: &Path) -> bool {
        let prefix = format!("ts_{}_{}_lat", self.variable, self.dataset);
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".parquet"))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.root
            .join("cfact")
            .join(format!("{}_{}_cfact.nc", self.variable, self.dataset))
    }

    /// Run summary of one worker.
    pub fn summary_path(&self, task_id: usize) -> PathBuf {
        self.root.join("summaries").join(format!(
            "summary_{}_{}_task{task_id}.json",
            self.variable, self.dataset
        ))
    }
}
