//! Breathing phases laid out on the sample buffer.
//!
//! Chart and guidance collaborators shade inhale and exhale stretches and need
//! to know which phase is in progress; both are derived here from the interval
//! series so they never have to search the timestamp buffer.
use crate::analysis::extrema::{Extrema, ExtremumKind};
use crate::analysis::intervals::{Interval, Intervals};
use serde::{Deserialize, Serialize};

/// Breathing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreathPhase {
    /// Maximum to minimum.
    Inhale,
    /// Minimum to maximum.
    Exhale,
}

/// A completed phase expressed in buffer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpan {
    /// Which phase.
    pub phase: BreathPhase,
    /// Buffer index where the phase starts.
    pub start_index: usize,
    /// Buffer index where the phase ends.
    pub end_index: usize,
    /// Start timestamp in milliseconds.
    pub start_time: i64,
    /// End timestamp in milliseconds.
    pub end_time: i64,
}

impl PhaseSpan {
    fn from_interval(phase: BreathPhase, interval: &Interval) -> Self {
        Self {
            phase,
            start_index: interval.start_index,
            end_index: interval.end_index,
            start_time: interval.start_time,
            end_time: interval.end_time,
        }
    }

    /// Span length in samples.
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    /// True for a span that covers no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every inhale and exhale span, ordered by start index.
pub fn phase_spans(intervals: &Intervals) -> Vec<PhaseSpan> {
    let mut spans: Vec<PhaseSpan> = intervals
        .max_to_min
        .iter()
        .map(|i| PhaseSpan::from_interval(BreathPhase::Inhale, i))
        .chain(
            intervals
                .min_to_max
                .iter()
                .map(|i| PhaseSpan::from_interval(BreathPhase::Exhale, i)),
        )
        .collect();
    spans.sort_by_key(|span| span.start_index);
    spans
}

/// Phase in progress after the most recent extremum.
///
/// A maximum starts an inhale and a minimum starts an exhale. `None` until the
/// first extremum is found.
pub fn current_phase(extrema: &Extrema) -> Option<BreathPhase> {
    extrema.latest().map(|(kind, _)| match kind {
        ExtremumKind::Maximum => BreathPhase::Inhale,
        ExtremumKind::Minimum => BreathPhase::Exhale,
    })
}
