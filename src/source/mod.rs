//! Sample sources feeding the engine.
//!
//! A [`SampleSource`] yields timestamped samples one at a time. The engine does
//! not care where they come from: [`synthetic::SyntheticBreath`] generates a
//! deterministic breathing waveform, and `csv_replay::CsvReplay` (feature
//! `csv_replay`) plays back a recorded trace.
//!
//! [`step`] and [`run`] move samples from a source into a
//! [`BreathingEngine`]. A sample the engine rejects is counted and skipped;
//! any other error ends the run.

#[cfg(feature = "csv_replay")]
pub mod csv_replay;
pub mod synthetic;

use crate::analysis::window::Sample;
use crate::engine::{AnalysisSnapshot, BreathingEngine};
use crate::error::{BreathError, BreathResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Producer of timestamped samples.
pub trait SampleSource {
    /// Next sample, `None` once the source is exhausted.
    fn next_sample(&mut self) -> Option<BreathResult<Sample>>;

    /// Nominal spacing between samples in milliseconds, used for real-time pacing.
    fn nominal_interval_ms(&self) -> u64;

    /// Human-readable description for logs.
    fn describe(&self) -> String {
        "sample source".to_string()
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> Option<BreathResult<Sample>> {
        (**self).next_sample()
    }

    fn nominal_interval_ms(&self) -> u64 {
        (**self).nominal_interval_ms()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpStats {
    /// Samples the engine accepted.
    pub accepted: u64,
    /// Samples the engine rejected.
    pub rejected: u64,
}

/// Outcome of moving one sample.
#[derive(Debug)]
pub enum Step {
    /// The sample was ingested and produced this snapshot.
    Accepted(Arc<AnalysisSnapshot>),
    /// The engine rejected the sample.
    Rejected(BreathError),
}

/// Move one sample from `source` into `engine`.
///
/// Returns `Ok(None)` once the source is exhausted.
pub fn step<S>(
    source: &mut S,
    engine: &mut BreathingEngine,
    stats: &mut PumpStats,
) -> BreathResult<Option<Step>>
where
    S: SampleSource + ?Sized,
{
    let Some(sample) = source.next_sample() else {
        return Ok(None);
    };
    match engine.ingest_sample(sample?) {
        Ok(snapshot) => {
            stats.accepted += 1;
            Ok(Some(Step::Accepted(snapshot)))
        }
        Err(err) if err.is_sample_rejection() => {
            stats.rejected += 1;
            Ok(Some(Step::Rejected(err)))
        }
        Err(err) => Err(err),
    }
}

/// Drain `source` into `engine`, calling `on_snapshot` after every accepted sample.
pub fn run<S, F>(source: &mut S, engine: &mut BreathingEngine, mut on_snapshot: F) -> BreathResult<PumpStats>
where
    S: SampleSource + ?Sized,
    F: FnMut(&Arc<AnalysisSnapshot>),
{
    let mut stats = PumpStats::default();
    while let Some(outcome) = step(source, engine, &mut stats)? {
        if let Step::Accepted(snapshot) = outcome {
            on_snapshot(&snapshot);
        }
    }
    debug!(
        source = %source.describe(),
        accepted = stats.accepted,
        rejected = stats.rejected,
        "Source exhausted"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    struct Fixed {
        samples: std::vec::IntoIter<BreathResult<Sample>>,
    }

    impl Fixed {
        fn new(samples: Vec<BreathResult<Sample>>) -> Self {
            Self {
                samples: samples.into_iter(),
            }
        }
    }

    impl SampleSource for Fixed {
        fn next_sample(&mut self) -> Option<BreathResult<Sample>> {
            self.samples.next()
        }

        fn nominal_interval_ms(&self) -> u64 {
            100
        }
    }

    fn engine() -> BreathingEngine {
        BreathingEngine::new(AnalysisConfig::default(), 0).unwrap()
    }

    #[test]
    fn run_counts_rejections_and_continues() {
        let mut source = Fixed::new(vec![
            Ok(Sample::new(0.1, 100)),
            Ok(Sample::new(f64::NAN, 200)),
            Ok(Sample::new(0.2, 50)),
            Ok(Sample::new(0.3, 300)),
        ]);
        let mut engine = engine();
        let mut sequences = Vec::new();

        let stats = run(&mut source, &mut engine, |s| sequences.push(s.sequence)).unwrap();

        assert_eq!(stats, PumpStats { accepted: 2, rejected: 2 });
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(engine.samples_ingested(), 2);
    }

    #[test]
    fn source_errors_end_the_run() {
        let mut source = Fixed::new(vec![
            Ok(Sample::new(0.1, 100)),
            Err(BreathError::Source("device unplugged".into())),
            Ok(Sample::new(0.3, 300)),
        ]);
        let mut engine = engine();

        let result = run(&mut source, &mut engine, |_| {});

        assert!(matches!(result, Err(BreathError::Source(_))));
        assert_eq!(engine.samples_ingested(), 1);
    }

    #[test]
    fn step_reports_exhaustion() {
        let mut source = Fixed::new(vec![]);
        let mut stats = PumpStats::default();
        assert!(step(&mut source, &mut engine(), &mut stats).unwrap().is_none());
        assert_eq!(source.describe(), "sample source");
    }
}
