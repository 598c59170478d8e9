//! Integration tests: traces and cell outputs through Parquet, and the merge
//! into a gridded NetCDF file.

use approx::assert_relative_eq;
use chrono::{NaiveDate, TimeDelta};
use ndarray::Array2;
use tempfile::tempdir;

use cfact_io::{
    ArtifactStore, CFACT_COLUMN, CellRecord, Compression, GridAxes, OutputCheck, WriterConfig,
    check_cell_output, merge_outputs, read_cell_output, read_trace, trace_is_complete,
    write_cell_output, write_trace,
};
use cfact_model::{
    BETA_TREND, BETA_YEARLY, HarmonicBasis, INTERCEPT, REQUIRED_PARAMS, Reconstruction,
    RegressionFrame, SIGMA, SLOPE,
};
use cfact_sampler::{ParamBlock, Trace};

const N_DAYS: usize = 60;

fn cell(row: usize, col: usize) -> CellRecord {
    CellRecord {
        row,
        col,
        lat: 50.0 + 0.5 * row as f64,
        lon: 10.0 + 0.5 * col as f64,
    }
}

fn axes() -> GridAxes {
    GridAxes::new(
        vec![50.0, 50.5],
        vec![10.0, 10.5, 11.0],
        (0..N_DAYS).map(|t| t as f64).collect(),
        "days since 2000-01-01",
        Some("standard".to_string()),
    )
}

/// Two chains of three draws with `modes = 1`.
fn trace() -> Trace {
    let blocks = vec![
        ParamBlock::scalar(INTERCEPT),
        ParamBlock::scalar(SLOPE),
        ParamBlock::positive(SIGMA),
        ParamBlock::vector(BETA_YEARLY, 2),
        ParamBlock::vector(BETA_TREND, 2),
    ];
    let values = Array2::from_shape_fn((6, 7), |(r, c)| 0.1 * (r + 1) as f64 + 0.01 * c as f64);
    Trace::new(blocks, 2, 3, values).unwrap()
}

fn reconstruction(offset: f64) -> Reconstruction {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..N_DAYS as i64)
        .map(|i| start + TimeDelta::days(i))
        .collect();
    let mut y: Vec<f64> = (0..N_DAYS).map(|i| offset + (i as f64 * 0.2).sin()).collect();
    y[7] = f64::NAN;
    let frame = RegressionFrame::from_dates(dates, &y, &[0.0, 0.5, 1.0]).unwrap();
    let basis = HarmonicBasis::yearly(frame.t(), frame.span_days(), 1);
    Reconstruction::new(&trace(), &basis, frame).unwrap()
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

#[test]
fn trace_round_trip() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "tas", "test");
    let path = store.trace_path(&cell(0, 1));
    let original = trace();

    write_trace(&path, &original, &cell(0, 1), &WriterConfig::default()).unwrap();
    assert!(trace_is_complete(&path, &REQUIRED_PARAMS).unwrap());

    let loaded = read_trace(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.chains(), 2);
    assert_eq!(loaded.column_names()[3], "beta_yearly__0");
}

#[test]
fn incomplete_trace_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.parquet");
    let blocks = vec![ParamBlock::scalar(INTERCEPT), ParamBlock::scalar(SLOPE)];
    let t = Trace::new(blocks, 1, 4, Array2::zeros((4, 2))).unwrap();
    write_trace(&path, &t, &cell(0, 0), &WriterConfig::default()).unwrap();

    assert!(!trace_is_complete(&path, &REQUIRED_PARAMS).unwrap());
    assert!(trace_is_complete(&path, &[INTERCEPT]).unwrap());
}

#[test]
fn absent_trace_is_not_complete() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("none.parquet");
    assert!(!trace_is_complete(&path, &REQUIRED_PARAMS).unwrap());
    assert!(read_trace(&path).is_err());
}

#[test]
fn corrupt_trace_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    std::fs::write(&path, b"garbage").unwrap();
    assert!(trace_is_complete(&path, &REQUIRED_PARAMS).is_err());
}

// ---------------------------------------------------------------------------
// Cell outputs
// ---------------------------------------------------------------------------

#[test]
fn output_round_trip() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "tas", "test");
    let recon = reconstruction(5.0);
    let config = WriterConfig::default().with_compression(Compression::Zstd);

    let path = write_cell_output(&store, &cell(1, 2), &recon, &config).unwrap();
    assert_eq!(path, store.output_path(&cell(1, 2)));
    assert_eq!(check_cell_output(&path, N_DAYS), OutputCheck::Valid);

    let out = read_cell_output(&path, &[CFACT_COLUMN, "trend"]).unwrap();
    assert_eq!(out.cell, cell(1, 2));
    assert_eq!(out.variable, "tas");
    assert_eq!(out.dataset, "test");
    assert_eq!(out.dates, recon.frame().dates());
    let cfact = out.column(CFACT_COLUMN).unwrap();
    assert!(cfact[7].is_nan());
    assert_relative_eq!(cfact[0], recon.cfact()[0]);
    assert_relative_eq!(out.column("trend").unwrap()[30], recon.trend()[30]);
    assert!(out.column("seasonal").is_none());
}

#[test]
fn output_with_wrong_length_is_invalid() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "tas", "test");
    let path = write_cell_output(&store, &cell(0, 0), &reconstruction(1.0), &WriterConfig::default())
        .unwrap();
    match check_cell_output(&path, N_DAYS + 1) {
        OutputCheck::Invalid { reason } => assert!(reason.contains("rows")),
        other => panic!("expected Invalid, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[test]
fn merge_places_cells_and_fills_gaps() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "tas", "test");
    let config = WriterConfig::default();
    let a = reconstruction(1.0);
    let b = reconstruction(2.0);
    write_cell_output(&store, &cell(0, 0), &a, &config).unwrap();
    write_cell_output(&store, &cell(1, 2), &b, &config).unwrap();
    // Another dataset in the same tree is ignored.
    let other = ArtifactStore::new(dir.path(), "tas", "other");
    write_cell_output(&other, &cell(0, 1), &a, &config).unwrap();

    let dest = store.merged_path();
    let summary = merge_outputs(&store, &axes(), &[CFACT_COLUMN], &dest).unwrap();
    assert_eq!(summary.merged, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.empty, 4);

    let file = netcdf::open(&dest).unwrap();
    let var = file.variable(CFACT_COLUMN).unwrap();
    let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    assert_eq!(dims, vec![N_DAYS, 2, 3]);
    let data: Vec<f64> = var.get_values::<f64, _>(..).unwrap();

    let at = |t: usize, r: usize, c: usize| data[t * 6 + r * 3 + c];
    assert_relative_eq!(at(0, 0, 0), a.cfact()[0]);
    assert_relative_eq!(at(20, 1, 2), b.cfact()[20]);
    assert!(at(7, 0, 0).is_nan());
    assert!(at(3, 0, 1).is_nan());

    let time = file.variable("time").unwrap();
    assert_eq!(time.get_values::<f64, _>(..).unwrap().len(), N_DAYS);
}

#[test]
fn merge_skips_off_grid_output() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "tas", "test");
    let far = CellRecord {
        row: 0,
        col: 0,
        lat: -30.0,
        lon: 140.0,
    };
    write_cell_output(&store, &far, &reconstruction(1.0), &WriterConfig::default()).unwrap();

    let summary = merge_outputs(&store, &axes(), &[CFACT_COLUMN], &store.merged_path()).unwrap();
    assert_eq!(summary.merged, 0);
    assert_eq!(summary.skipped, 1);
}
