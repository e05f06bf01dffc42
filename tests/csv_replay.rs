//! Replay of recorded traces through the engine.
#![cfg(feature = "csv_replay")]

use breath_pattern::analysis::{BreathingType, Stability};
use breath_pattern::config::AnalysisConfig;
use breath_pattern::engine::BreathingEngine;
use breath_pattern::error::BreathError;
use breath_pattern::source::csv_replay::CsvReplay;
use breath_pattern::source::synthetic::{SyntheticBreath, SyntheticConfig};
use breath_pattern::source::{run, SampleSource};
use std::io::Write;
use tempfile::TempDir;

/// Record `samples` synthetic samples to a CSV trace.
fn record_trace(dir: &TempDir, period_s: f64, samples: u64) -> std::path::PathBuf {
    let path = dir.path().join("trace.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "timestamp_ms,value").unwrap();

    let source = SyntheticBreath::new(SyntheticConfig {
        period_s,
        samples: Some(samples),
        ..Default::default()
    })
    .unwrap();
    for sample in source {
        // `{:?}` prints the shortest representation that parses back exactly.
        writeln!(file, "{},{:?}", sample.timestamp_ms, sample.value).unwrap();
    }
    path
}

#[test]
fn test_replayed_trace_matches_live_run() {
    let dir = TempDir::new().unwrap();
    let path = record_trace(&dir, 8.0, 500);

    let mut replay = CsvReplay::open(&path, 100).unwrap();
    assert!(replay.describe().contains("trace.csv"));
    let mut replayed = BreathingEngine::new(AnalysisConfig::default(), 0).unwrap();
    let stats = run(&mut replay, &mut replayed, |_| {}).unwrap();
    assert_eq!(stats.accepted, 500);

    let mut live_source = SyntheticBreath::new(SyntheticConfig {
        period_s: 8.0,
        samples: Some(500),
        ..Default::default()
    })
    .unwrap();
    let mut live = BreathingEngine::new(AnalysisConfig::default(), 0).unwrap();
    run(&mut live_source, &mut live, |_| {}).unwrap();

    assert_eq!(*replayed.snapshot(), *live.snapshot());
    assert_eq!(
        replayed.snapshot().breathing.kind,
        BreathingType::Deep(Stability::Stable)
    );
}

#[test]
fn test_out_of_order_rows_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("glitchy.csv");
    std::fs::write(
        &path,
        "timestamp_ms,value\n100,0.1\n200,0.2\n150,0.9\n300,NaN\n400,0.4\n",
    )
    .unwrap();

    let mut replay = CsvReplay::open(&path, 100).unwrap();
    let mut engine = BreathingEngine::new(AnalysisConfig::default(), 0).unwrap();
    let stats = run(&mut replay, &mut engine, |_| {}).unwrap();

    assert_eq!(stats.accepted, 3);
    assert_eq!(stats.rejected, 2);
    assert_eq!(engine.snapshot().raw.last(), Some(&0.4));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let result = CsvReplay::open(dir.path().join("absent.csv"), 100);
    assert!(matches!(result, Err(BreathError::Io(_))));
}

#[test]
fn test_corrupt_row_ends_the_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.csv");
    std::fs::write(&path, "timestamp_ms,value\n100,0.1\n200,oops\n300,0.3\n").unwrap();

    let mut replay = CsvReplay::open(&path, 100).unwrap();
    let mut engine = BreathingEngine::new(AnalysisConfig::default(), 0).unwrap();

    assert!(matches!(
        run(&mut replay, &mut engine, |_| {}),
        Err(BreathError::Csv(_))
    ));
    assert_eq!(engine.samples_ingested(), 1);
}
