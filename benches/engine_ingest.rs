//! Criterion benchmarks for the per-sample analysis path.
//!
//! Every ingest rescans the whole smoothed buffer for extrema, so the cost of
//! one sample grows with capacity. These benchmarks track:
//! - Ingest latency at several buffer capacities
//! - Extrema detection alone on a full buffer
//!
//! Run with: cargo bench --bench engine_ingest

use breath_pattern::analysis::ExtremaDetector;
use breath_pattern::config::AnalysisConfig;
use breath_pattern::engine::BreathingEngine;
use breath_pattern::source::synthetic::{SyntheticBreath, SyntheticConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn warmed_engine(capacity: usize) -> (BreathingEngine, SyntheticBreath) {
    let config = AnalysisConfig {
        capacity,
        ..Default::default()
    };
    let mut engine = BreathingEngine::new(config, 0).unwrap();
    let mut source = SyntheticBreath::new(SyntheticConfig {
        noise: 0.02,
        ..Default::default()
    })
    .unwrap();
    for sample in source.by_ref().take(capacity) {
        engine.ingest_sample(sample).unwrap();
    }
    (engine, source)
}

/// Steady-state cost of one sample, buffers already full.
fn engine_ingest_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_ingest");
    group.throughput(Throughput::Elements(1));

    for capacity in [350usize, 1_000, 5_000] {
        let (mut engine, mut source) = warmed_engine(capacity);
        group.bench_with_input(BenchmarkId::new("ingest", capacity), &capacity, |b, _| {
            b.iter(|| {
                let sample = source.next().unwrap();
                black_box(engine.ingest_sample(sample).unwrap());
            });
        });
    }

    group.finish();
}

/// Extrema detection on a full smoothed buffer.
fn extrema_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("extrema_detection");

    for capacity in [350usize, 5_000] {
        let (engine, _) = warmed_engine(capacity);
        let snapshot = engine.snapshot();
        let detector = ExtremaDetector::new(0.1, 27);
        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(BenchmarkId::new("detect", capacity), &capacity, |b, _| {
            b.iter(|| black_box(detector.detect(&snapshot.smoothed, &snapshot.timestamps)));
        });
    }

    group.finish();
}

criterion_group!(benches, engine_ingest_latency, extrema_detection);
criterion_main!(benches);
