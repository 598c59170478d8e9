//! Persisted posterior traces.
//!
//! A trace file holds a `chain` column and one `Float64` column per flat
//! parameter name. The block layout is stored in the file's key-value
//! metadata so completeness can be checked from the footer alone.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch, UInt32Array};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::metadata::KeyValue;
use tracing::debug;

use cfact_sampler::{ParamBlock, Trace, Transform};

use crate::error::IoError;
use crate::grid::CellRecord;
use crate::writer::{WriterConfig, write_batch};

const CHAIN_COLUMN: &str = "chain";
const KEY_BLOCKS: &str = "cfact.blocks";
const KEY_CHAINS: &str = "cfact.chains";
const KEY_DRAWS: &str = "cfact.draws_per_chain";
const KEY_LAT: &str = "cfact.lat";
const KEY_LON: &str = "cfact.lon";

/// Layout recorded in a trace file's footer.
#[derive(Debug, Clone, PartialEq)]
struct TraceLayout {
    blocks: Vec<ParamBlock>,
    chains: usize,
    draws_per_chain: usize,
}

fn encode_blocks(blocks: &[ParamBlock]) -> String {
    blocks
        .iter()
        .map(|b| format!("{}:{}:{}", b.name(), b.len(), b.transform().tag()))
        .collect::<Vec<_>>()
        .join(";")
}

fn decode_blocks(s: &str) -> Option<Vec<ParamBlock>> {
    s.split(';')
        .map(|entry| {
            let mut parts = entry.split(':');
            let name = parts.next().filter(|n| !n.is_empty())?;
            let len = parts.next()?.parse::<usize>().ok().filter(|&n| n > 0)?;
            let transform = Transform::from_tag(parts.next()?)?;
            parts
                .next()
                .is_none()
                .then(|| ParamBlock::new(name, len, transform))
        })
        .collect()
}

/// Writes `trace` for `cell` to `path`, replacing any previous file.
///
/// # Errors
///
/// Returns [`IoError::Fs`] or [`IoError::Parquet`] if the file cannot be
/// written.
pub fn write_trace(
    path: &Path,
    trace: &Trace,
    cell: &CellRecord,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let names = trace.column_names();
    let mut fields = vec![Field::new(CHAIN_COLUMN, DataType::UInt32, false)];
    fields.extend(names.iter().map(|n| Field::new(n, DataType::Float64, false)));
    let schema = Arc::new(Schema::new(fields));

    let dpc = trace.draws_per_chain();
    let chain: Vec<u32> = (0..trace.n_draws()).map(|i| (i / dpc.max(1)) as u32).collect();
    let mut columns: Vec<ArrayRef> = vec![Arc::new(UInt32Array::from(chain))];
    for col in trace.values().columns() {
        columns.push(Arc::new(Float64Array::from(col.to_vec())));
    }
    let batch = RecordBatch::try_new(schema, columns)?;

    let metadata = vec![
        KeyValue::new(KEY_BLOCKS.to_string(), encode_blocks(trace.blocks())),
        KeyValue::new(KEY_CHAINS.to_string(), trace.chains().to_string()),
        KeyValue::new(KEY_DRAWS.to_string(), dpc.to_string()),
        KeyValue::new(KEY_LAT.to_string(), cell.lat.to_string()),
        KeyValue::new(KEY_LON.to_string(), cell.lon.to_string()),
    ];
    write_batch(path, &batch, metadata, config)?;
    debug!(path = %path.display(), draws = trace.n_draws(), "trace written");
    Ok(())
}

fn open_builder(
    path: &Path,
) -> Result<ParquetRecordBatchReaderBuilder<std::fs::File>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|e| IoError::fs(path, e))?;
    Ok(ParquetRecordBatchReaderBuilder::try_new(file)?)
}

fn layout_of(
    builder: &ParquetRecordBatchReaderBuilder<std::fs::File>,
    path: &Path,
) -> Result<TraceLayout, IoError> {
    let kv = builder.metadata().file_metadata().key_value_metadata();
    let lookup = |key: &str| {
        kv.and_then(|entries| entries.iter().find(|e| e.key == key))
            .and_then(|e| e.value.clone())
            .ok_or_else(|| IoError::malformed(path, format!("missing '{key}' metadata")))
    };
    let blocks = decode_blocks(&lookup(KEY_BLOCKS)?)
        .ok_or_else(|| IoError::malformed(path, "unreadable parameter layout"))?;
    let count = |key: &str| -> Result<usize, IoError> {
        lookup(key)?
            .parse()
            .map_err(|_| IoError::malformed(path, format!("'{key}' is not a count")))
    };
    Ok(TraceLayout {
        blocks,
        chains: count(KEY_CHAINS)?,
        draws_per_chain: count(KEY_DRAWS)?,
    })
}

/// Whether the trace at `path` has draws for every parameter in `required`.
///
/// Reads only the footer: schema, row count and layout metadata. A missing
/// file is not complete.
///
/// # Errors
///
/// Returns [`IoError::Parquet`] or [`IoError::MalformedArtifact`] if the
/// file exists but cannot be interpreted.
pub fn trace_is_complete(path: &Path, required: &[&str]) -> Result<bool, IoError> {
    if !path.exists() {
        return Ok(false);
    }
    let builder = open_builder(path)?;
    let layout = layout_of(&builder, path)?;

    if let Some(missing) = required
        .iter()
        .find(|name| !layout.blocks.iter().any(|b| b.name() == **name))
    {
        debug!(path = %path.display(), param = %missing, "trace lacks parameter");
        return Ok(false);
    }
    let schema = builder.schema();
    let columns_present = layout
        .blocks
        .iter()
        .flat_map(ParamBlock::column_names)
        .all(|n| schema.column_with_name(&n).is_some());
    let rows = builder.metadata().file_metadata().num_rows();
    let expected_rows = (layout.chains * layout.draws_per_chain) as i64;
    Ok(columns_present && rows > 0 && rows == expected_rows)
}

/// Reads a trace written by [`write_trace`].
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file is absent,
/// [`IoError::MalformedArtifact`] if its layout or columns are inconsistent,
/// or [`IoError::Parquet`] on decoding failures.
pub fn read_trace(path: &Path) -> Result<Trace, IoError> {
    let builder = open_builder(path)?;
    let layout = layout_of(&builder, path)?;
    let names: Vec<String> = layout
        .blocks
        .iter()
        .flat_map(ParamBlock::column_names)
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for batch in builder.build()? {
        let batch = batch?;
        for (name, dest) in names.iter().zip(columns.iter_mut()) {
            let array = batch
                .column_by_name(name)
                .ok_or_else(|| IoError::malformed(path, format!("missing column '{name}'")))?;
            let values = array
                .as_primitive_opt::<Float64Type>()
                .ok_or_else(|| IoError::malformed(path, format!("column '{name}' is not f64")))?;
            if values.null_count() > 0 {
                return Err(IoError::malformed(path, format!("column '{name}' has nulls")));
            }
            dest.extend_from_slice(values.values());
        }
    }

    let rows = columns.first().map_or(0, Vec::len);
    let values = Array2::from_shape_fn((rows, names.len()), |(r, j)| columns[j][r]);
    Trace::new(layout.blocks, layout.chains, layout.draws_per_chain, values)
        .map_err(|e| IoError::malformed(path, e.to_string()))
}
