//! Interval Calculator.
//!
//! Derives three duration series from one scan's extrema:
//!
//! * **max → max**: consecutive maxima, one full breath.
//! * **max → min**: a maximum followed directly by a minimum (inhale).
//! * **min → max**: a minimum followed directly by a maximum (exhale).
//!
//! Inhales and exhales come from walking maxima and minima merged in timestamp
//! order. Two neighbours of the same kind are skipped, so the inhale and exhale
//! series need not have equal lengths. Pairs with equal timestamps are skipped in
//! every series, which keeps every interval strictly positive.

use crate::analysis::extrema::{Extrema, ExtremumKind, Peak};
use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::slice::Iter;

/// Time between two extrema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// `(end_time - start_time) / 1000`, in seconds.
    pub duration: f64,
    /// Timestamp of the first extremum in milliseconds.
    pub start_time: i64,
    /// Timestamp of the second extremum in milliseconds.
    pub end_time: i64,
    /// Buffer index of the first extremum.
    pub start_index: usize,
    /// Buffer index of the second extremum.
    pub end_index: usize,
}

impl Interval {
    /// Interval from `start` to `end`, or `None` unless `end` is strictly later.
    pub fn between(start: &Peak, end: &Peak) -> Option<Self> {
        if end.timestamp <= start.timestamp {
            return None;
        }
        Some(Self {
            duration: (end.timestamp - start.timestamp) as f64 / 1000.0,
            start_time: start.timestamp,
            end_time: end.timestamp,
            start_index: start.index,
            end_index: end.index,
        })
    }
}

/// The three interval series of one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intervals {
    /// Maximum to next maximum (breath period).
    pub max_to_max: Vec<Interval>,
    /// Maximum to the following minimum (inhale).
    pub max_to_min: Vec<Interval>,
    /// Minimum to the following maximum (exhale).
    pub min_to_max: Vec<Interval>,
}

impl Intervals {
    /// Inhale durations in seconds, oldest first.
    pub fn inhale_durations(&self) -> Vec<f64> {
        self.max_to_min.iter().map(|i| i.duration).collect()
    }

    /// Exhale durations in seconds, oldest first.
    pub fn exhale_durations(&self) -> Vec<f64> {
        self.min_to_max.iter().map(|i| i.duration).collect()
    }
}

/// Derive the interval series from `extrema`.
pub fn calculate_intervals(extrema: &Extrema) -> Intervals {
    let mut intervals = Intervals {
        max_to_max: extrema
            .maxima
            .windows(2)
            .filter_map(|pair| Interval::between(&pair[0], &pair[1]))
            .collect(),
        ..Default::default()
    };

    let mut merged = chronological(extrema).peekable();
    while let Some((kind, current)) = merged.next() {
        let Some(&(next_kind, next)) = merged.peek() else {
            break;
        };
        let series = match (kind, next_kind) {
            (ExtremumKind::Maximum, ExtremumKind::Minimum) => &mut intervals.max_to_min,
            (ExtremumKind::Minimum, ExtremumKind::Maximum) => &mut intervals.min_to_max,
            _ => continue,
        };
        if let Some(interval) = Interval::between(current, next) {
            series.push(interval);
        }
    }

    intervals
}

/// Maxima and minima merged by timestamp; a maximum goes first on a tie.
///
/// Both inputs are already in timestamp order, so this is a linear merge.
pub fn chronological(extrema: &Extrema) -> impl Iterator<Item = (ExtremumKind, &Peak)> {
    ChronologicalMerge {
        maxima: extrema.maxima.iter().peekable(),
        minima: extrema.minima.iter().peekable(),
    }
}

struct ChronologicalMerge<'a> {
    maxima: Peekable<Iter<'a, Peak>>,
    minima: Peekable<Iter<'a, Peak>>,
}

impl<'a> Iterator for ChronologicalMerge<'a> {
    type Item = (ExtremumKind, &'a Peak);

    fn next(&mut self) -> Option<Self::Item> {
        let take_max = match (self.maxima.peek(), self.minima.peek()) {
            (Some(max), Some(min)) => max.timestamp <= min.timestamp,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };
        if take_max {
            self.maxima.next().map(|p| (ExtremumKind::Maximum, p))
        } else {
            self.minima.next().map(|p| (ExtremumKind::Minimum, p))
        }
    }
}
