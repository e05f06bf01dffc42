//! Sliding Window Store.
//!
//! Four fixed-capacity buffers (raw, smoothed, deviation, timestamp) that always
//! hold exactly `capacity` entries and advance together: every append evicts the
//! oldest entry of each. Storage is a circular buffer addressed with index
//! arithmetic, so an append never shifts or reallocates.

use crate::analysis::smoothing;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Single-axis acceleration.
    pub value: f64,
    /// Wall-clock time in milliseconds.
    pub timestamp_ms: i64,
}

impl Sample {
    /// Create a sample.
    pub fn new(value: f64, timestamp_ms: i64) -> Self {
        Self {
            value,
            timestamp_ms,
        }
    }
}

/// Fixed-capacity circular buffer, read in chronological order.
///
/// The buffer is created full; `push` overwrites the oldest slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RingSeries<T> {
    slots: Vec<T>,
    // Slot holding the oldest element.
    head: usize,
}

impl<T: Copy> RingSeries<T> {
    /// Create a buffer of `capacity` copies of `fill`.
    pub fn filled(capacity: usize, fill: T) -> Self {
        Self {
            slots: vec![fill; capacity],
            head: 0,
        }
    }

    /// Number of elements, which is also the capacity.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for a zero-capacity buffer.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append `value`, returning the evicted oldest element.
    ///
    /// A zero-capacity buffer hands `value` straight back.
    pub fn push(&mut self, value: T) -> T {
        if self.slots.is_empty() {
            return value;
        }
        let evicted = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.slots.len();
        evicted
    }

    /// Element at chronological position `index` (0 is the oldest).
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.slots.len() {
            return None;
        }
        Some(self.slots[(self.head + index) % self.slots.len()])
    }

    /// Most recently pushed element.
    pub fn latest(&self) -> Option<T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Iterate over the newest `n` elements, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &T> + '_ {
        self.iter().skip(self.len().saturating_sub(n))
    }

    /// Copy the contents, oldest first, into a shared immutable slice.
    pub fn to_shared(&self) -> Arc<[T]> {
        self.iter().copied().collect()
    }
}

/// Read-only copies of the four buffers, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowViews {
    /// Raw accelerometer values.
    pub raw: Arc<[f64]>,
    /// Moving average of `raw` at each sample.
    pub smoothed: Arc<[f64]>,
    /// `raw - smoothed` at each sample.
    pub deviation: Arc<[f64]>,
    /// Sample timestamps in milliseconds.
    pub timestamps: Arc<[i64]>,
}

/// Raw, smoothed, deviation and timestamp buffers advancing in lock-step.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    raw: RingSeries<f64>,
    smoothed: RingSeries<f64>,
    deviation: RingSeries<f64>,
    timestamps: RingSeries<i64>,
    ma_window: usize,
}

impl SlidingWindow {
    /// Create the store pre-filled with zeros, every timestamp set to `origin_ms`.
    pub fn new(capacity: usize, ma_window: usize, origin_ms: i64) -> Self {
        Self {
            raw: RingSeries::filled(capacity, 0.0),
            smoothed: RingSeries::filled(capacity, 0.0),
            deviation: RingSeries::filled(capacity, 0.0),
            timestamps: RingSeries::filled(capacity, origin_ms),
            ma_window,
        }
    }

    /// Buffer capacity.
    pub fn capacity(&self) -> usize {
        self.raw.len()
    }

    /// Append a sample to all four buffers.
    ///
    /// The smoothed value is the trailing mean of the raw buffer including the new
    /// sample, and the deviation is the new raw value minus that mean.
    pub fn append(&mut self, sample: Sample) {
        self.raw.push(sample.value);
        self.timestamps.push(sample.timestamp_ms);

        let smoothed = smoothing::trailing_mean(&self.raw, self.ma_window);
        self.smoothed.push(smoothed);
        self.deviation.push(sample.value - smoothed);
    }

    /// Timestamp of the newest entry.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.timestamps.latest()
    }

    /// Copy out all four buffers.
    pub fn snapshot(&self) -> WindowViews {
        WindowViews {
            raw: self.raw.to_shared(),
            smoothed: self.smoothed.to_shared(),
            deviation: self.deviation.to_shared(),
            timestamps: self.timestamps.to_shared(),
        }
    }
}
