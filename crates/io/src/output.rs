//! Per-cell output tables: the regression frame, posterior components and
//! counterfactual, keyed by date.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Date32Array, Float64Array, RecordBatch};
use arrow::datatypes::{DataType, Date32Type, Field, Float64Type, Schema};
use chrono::{NaiveDate, TimeDelta};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::metadata::KeyValue;
use tracing::debug;

use cfact_model::Reconstruction;

use crate::error::IoError;
use crate::grid::CellRecord;
use crate::store::ArtifactStore;
use crate::writer::{WriterConfig, write_batch};

pub const DATE_COLUMN: &str = "ds";
pub const CFACT_COLUMN: &str = "cfact";

/// Value columns of every output table, after [`DATE_COLUMN`].
pub const VALUE_COLUMNS: [&str; 10] = [
    "t",
    "y",
    "y_scaled",
    "gmt",
    "gmt_scaled",
    "trend",
    "seasonal",
    "seasonal_trend",
    "reconstruction",
    CFACT_COLUMN,
];

const KEY_LAT: &str = "cfact.lat";
const KEY_LON: &str = "cfact.lon";
const KEY_ROW: &str = "cfact.row";
const KEY_COL: &str = "cfact.col";
const KEY_VARIABLE: &str = "cfact.variable";
const KEY_DATASET: &str = "cfact.dataset";

/// `NaiveDate::default()` is the Unix epoch, the origin of `Date32`.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn value_columns(r: &Reconstruction) -> [&[f64]; 10] {
    let f = r.frame();
    [
        f.t(),
        f.y(),
        f.y_scaled(),
        f.gmt(),
        f.gmt_scaled(),
        r.trend(),
        r.seasonal(),
        r.seasonal_trend(),
        r.posterior(),
        r.cfact(),
    ]
}

/// Writes the output table of `cell` to its path in `store`.
///
/// # Errors
///
/// Returns [`IoError::Fs`] or [`IoError::Parquet`] if the file cannot be
/// written.
pub fn write_cell_output(
    store: &ArtifactStore,
    cell: &CellRecord,
    recon: &Reconstruction,
    config: &WriterConfig,
) -> Result<PathBuf, IoError> {
    let mut fields = vec![Field::new(DATE_COLUMN, DataType::Date32, false)];
    fields.extend(
        VALUE_COLUMNS
            .iter()
            .map(|n| Field::new(*n, DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let days: Vec<i32> = recon
        .frame()
        .dates()
        .iter()
        .map(|d| (*d - epoch()).num_days() as i32)
        .collect();
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Date32Array::from(days))];
    for values in value_columns(recon) {
        columns.push(Arc::new(Float64Array::from(values.to_vec())));
    }
    let batch = RecordBatch::try_new(schema, columns)?;

    let metadata = vec![
        KeyValue::new(KEY_LAT.to_string(), cell.lat.to_string()),
        KeyValue::new(KEY_LON.to_string(), cell.lon.to_string()),
        KeyValue::new(KEY_ROW.to_string(), cell.row.to_string()),
        KeyValue::new(KEY_COL.to_string(), cell.col.to_string()),
        KeyValue::new(KEY_VARIABLE.to_string(), store.variable().to_string()),
        KeyValue::new(KEY_DATASET.to_string(), store.dataset().to_string()),
    ];
    let path = store.output_path(cell);
    write_batch(&path, &batch, metadata, config)?;
    debug!(path = %path.display(), rows = recon.len(), "cell output written");
    Ok(path)
}

/// Outcome of probing an existing output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCheck {
    /// No file at the path.
    Missing,
    /// A file exists but cannot be reused.
    Invalid { reason: String },
    /// A complete output; the cell needs no further work.
    Valid,
}

impl OutputCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Probes the output at `path`: readable, every column present,
/// `expected_rows` rows and at least one non-missing counterfactual value.
///
/// Only the counterfactual column is decoded.
pub fn check_cell_output(path: &Path, expected_rows: usize) -> OutputCheck {
    if !path.exists() {
        return OutputCheck::Missing;
    }
    match probe_output(path, expected_rows) {
        Ok(None) => OutputCheck::Valid,
        Ok(Some(reason)) => OutputCheck::Invalid { reason },
        Err(e) => OutputCheck::Invalid {
            reason: e.to_string(),
        },
    }
}

fn probe_output(path: &Path, expected_rows: usize) -> Result<Option<String>, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::fs(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    if let Some(missing) = std::iter::once(DATE_COLUMN)
        .chain(VALUE_COLUMNS)
        .find(|c| schema.column_with_name(c).is_none())
    {
        return Ok(Some(format!("missing column '{missing}'")));
    }
    let rows = builder.metadata().file_metadata().num_rows();
    if rows != expected_rows as i64 {
        return Ok(Some(format!("{rows} rows, expected {expected_rows}")));
    }

    let (idx, _) = schema
        .column_with_name(CFACT_COLUMN)
        .ok_or_else(|| IoError::malformed(path, "no cfact column"))?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), [idx]);
    for batch in builder.with_projection(mask).build()? {
        let batch = batch?;
        if let Some(values) = batch.column(0).as_primitive_opt::<Float64Type>()
            && values.iter().flatten().any(|v| !v.is_nan())
        {
            return Ok(None);
        }
    }
    Ok(Some("counterfactual is entirely missing".to_string()))
}

/// Selected columns of one output table with its cell identity.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOutput {
    pub cell: CellRecord,
    pub variable: String,
    pub dataset: String,
    pub dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl CellOutput {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Reads the dates and the named value `columns` of an output table.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if absent,
/// [`IoError::MalformedArtifact`] if the cell metadata or a requested column
/// is missing, and [`IoError::Parquet`] on decoding failures.
pub fn read_cell_output(path: &Path, columns: &[&str]) -> Result<CellOutput, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|e| IoError::fs(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let kv = builder.metadata().file_metadata().key_value_metadata();
    let meta = |key: &str| {
        kv.and_then(|entries| entries.iter().find(|e| e.key == key))
            .and_then(|e| e.value.clone())
            .ok_or_else(|| IoError::malformed(path, format!("missing '{key}' metadata")))
    };
    let number = |key: &str| -> Result<f64, IoError> {
        meta(key)?
            .parse()
            .map_err(|_| IoError::malformed(path, format!("'{key}' is not a number")))
    };
    let index = |key: &str| -> Result<usize, IoError> {
        meta(key)?
            .parse()
            .map_err(|_| IoError::malformed(path, format!("'{key}' is not an index")))
    };
    let cell = CellRecord {
        row: index(KEY_ROW)?,
        col: index(KEY_COL)?,
        lat: number(KEY_LAT)?,
        lon: number(KEY_LON)?,
    };
    let variable = meta(KEY_VARIABLE)?;
    let dataset = meta(KEY_DATASET)?;

    let schema = builder.schema().clone();
    let mut wanted = vec![DATE_COLUMN];
    wanted.extend_from_slice(columns);
    let mut roots = Vec::with_capacity(wanted.len());
    for name in &wanted {
        let (idx, _) = schema
            .column_with_name(name)
            .ok_or_else(|| IoError::malformed(path, format!("missing column '{name}'")))?;
        roots.push(idx);
    }
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);

    let mut dates = Vec::new();
    let mut values: BTreeMap<String, Vec<f64>> =
        columns.iter().map(|c| (c.to_string(), Vec::new())).collect();
    for batch in builder.with_projection(mask).build()? {
        let batch = batch?;
        let ds = batch
            .column_by_name(DATE_COLUMN)
            .and_then(|a| a.as_primitive_opt::<Date32Type>())
            .ok_or_else(|| IoError::malformed(path, "'ds' is not a date column"))?;
        for day in ds.iter() {
            let day = day.ok_or_else(|| IoError::malformed(path, "null date"))?;
            let date = epoch()
                .checked_add_signed(TimeDelta::days(i64::from(day)))
                .ok_or_else(|| IoError::malformed(path, format!("date {day} out of range")))?;
            dates.push(date);
        }
        for (name, dest) in values.iter_mut() {
            let col = batch
                .column_by_name(name)
                .and_then(|a| a.as_primitive_opt::<Float64Type>())
                .ok_or_else(|| IoError::malformed(path, format!("column '{name}' is not f64")))?;
            dest.extend(col.iter().map(|v| v.unwrap_or(f64::NAN)));
        }
    }

    Ok(CellOutput {
        cell,
        variable,
        dataset,
        dates,
        columns: values,
    })
}
