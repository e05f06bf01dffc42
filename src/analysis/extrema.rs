//! Extrema Detector.
//!
//! Index `i` of the smoothed buffer is a maximum when
//!
//! * it equals the maximum of the symmetric window `[i - patience, i + patience]`,
//! * it lies at least `patience` samples after the previously accepted maximum, and
//! * its absolute value exceeds `threshold`.
//!
//! Minima follow the same rule with the window minimum and their own spacing
//! marker. Only `patience..len - patience` is scanned, so every window is full.
//!
//! On a plateau the first index reached is accepted and the spacing rule rejects
//! the next `patience - 1` points. A plateau wider than `patience` therefore
//! yields one extremum every `patience` samples.
//!
//! The window extremum is tracked with monotonic deques, which gives the same
//! values as re-reading every window but in O(len) per scan. Any NaN inside a
//! window disqualifies that window.

use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// An accepted extremum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Smoothed value at the extremum.
    pub value: f64,
    /// Timestamp of the extremum in milliseconds.
    pub timestamp: i64,
    /// Position in the smoothed buffer at detection time.
    pub index: usize,
}

/// Which kind of extremum a [`Peak`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremumKind {
    /// Local maximum (end of exhale, start of inhale).
    Maximum,
    /// Local minimum (end of inhale, start of exhale).
    Minimum,
}

/// Maxima and minima of one scan, each in buffer order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    /// Accepted maxima.
    pub maxima: Vec<Peak>,
    /// Accepted minima.
    pub minima: Vec<Peak>,
}

impl Extrema {
    /// Total number of extrema.
    pub fn len(&self) -> usize {
        self.maxima.len() + self.minima.len()
    }

    /// True when nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.maxima.is_empty() && self.minima.is_empty()
    }

    /// The extremum with the highest buffer index.
    pub fn latest(&self) -> Option<(ExtremumKind, &Peak)> {
        match (self.maxima.last(), self.minima.last()) {
            (Some(max), Some(min)) if max.index >= min.index => Some((ExtremumKind::Maximum, max)),
            (_, Some(min)) => Some((ExtremumKind::Minimum, min)),
            (Some(max), None) => Some((ExtremumKind::Maximum, max)),
            (None, None) => None,
        }
    }
}

/// Windowed-equality peak and trough detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremaDetector {
    threshold: f64,
    patience: usize,
}

impl ExtremaDetector {
    /// Create a detector.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum absolute value for an extremum.
    /// * `patience` - Window half-width and minimum spacing between extrema of the
    ///   same kind, in samples.
    pub fn new(threshold: f64, patience: usize) -> Self {
        Self {
            threshold,
            patience,
        }
    }

    /// Detector configured from the analysis parameters.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.peak_threshold, config.peak_patience)
    }

    /// Minimum absolute value for an extremum.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Window half-width and same-kind spacing.
    pub fn patience(&self) -> usize {
        self.patience
    }

    /// Scan `data` for extrema. `timestamps` is parallel to `data`; if the two
    /// differ in length only the common prefix is scanned.
    pub fn detect(&self, data: &[f64], timestamps: &[i64]) -> Extrema {
        let len = data.len().min(timestamps.len());
        let p = self.patience;
        let mut extrema = Extrema::default();
        if len < 2 * p + 1 {
            return extrema;
        }

        let mut window = WindowExtremes::new(data);
        for j in 0..2 * p {
            window.enter(j);
        }

        let mut last_max: Option<usize> = None;
        let mut last_min: Option<usize> = None;
        let spaced = |last: Option<usize>, i: usize| last.map_or(true, |last| i - last >= p);

        for i in p..len - p {
            window.enter(i + p);
            if i > p {
                window.leave(i - p - 1);
            }

            let Some((max, min)) = window.extremes() else {
                continue;
            };
            let value = data[i];
            let peak = Peak {
                value,
                timestamp: timestamps[i],
                index: i,
            };

            // An index accepted as a maximum is not also considered as a minimum,
            // which only matters for a constant window.
            if value == max && spaced(last_max, i) && value.abs() > self.threshold {
                extrema.maxima.push(peak);
                last_max = Some(i);
            } else if value == min && spaced(last_min, i) && value.abs() > self.threshold {
                extrema.minima.push(peak);
                last_min = Some(i);
            }
        }

        extrema
    }
}

/// Running maximum and minimum of a sliding index window.
struct WindowExtremes<'a> {
    data: &'a [f64],
    // Indices with non-increasing values; front is the window maximum.
    maxima: VecDeque<usize>,
    // Indices with non-decreasing values; front is the window minimum.
    minima: VecDeque<usize>,
    nan_count: usize,
}

impl<'a> WindowExtremes<'a> {
    fn new(data: &'a [f64]) -> Self {
        Self {
            data,
            maxima: VecDeque::new(),
            minima: VecDeque::new(),
            nan_count: 0,
        }
    }

    fn enter(&mut self, index: usize) {
        let value = self.data[index];
        if value.is_nan() {
            self.nan_count += 1;
            return;
        }
        while self
            .maxima
            .back()
            .is_some_and(|&back| self.data[back] <= value)
        {
            self.maxima.pop_back();
        }
        self.maxima.push_back(index);
        while self
            .minima
            .back()
            .is_some_and(|&back| self.data[back] >= value)
        {
            self.minima.pop_back();
        }
        self.minima.push_back(index);
    }

    fn leave(&mut self, index: usize) {
        if self.data[index].is_nan() {
            self.nan_count -= 1;
            return;
        }
        if self.maxima.front() == Some(&index) {
            self.maxima.pop_front();
        }
        if self.minima.front() == Some(&index) {
            self.minima.pop_front();
        }
    }

    /// `(max, min)` of the current window, or `None` if it contains a NaN.
    fn extremes(&self) -> Option<(f64, f64)> {
        if self.nan_count > 0 {
            return None;
        }
        let max = self.data[*self.maxima.front()?];
        let min = self.data[*self.minima.front()?];
        Some((max, min))
    }
}
