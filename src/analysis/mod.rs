//! Breathing-pattern analysis stages.
//!
//! Each stage is usable on its own; [`crate::engine::BreathingEngine`] chains them
//! once per sample:
//!
//! 1. [`window`] appends the sample to the fixed-capacity buffers and
//!    [`smoothing`] derives the smoothed and deviation values.
//! 2. [`extrema`] re-scans the smoothed buffer for peaks and troughs.
//! 3. [`intervals`] turns the extrema into breath, inhale and exhale durations.
//! 4. [`classifier`] reduces the latest durations to a breathing verdict.
//! 5. [`phases`] maps intervals onto buffer positions for display.
pub mod classifier;
pub mod extrema;
pub mod intervals;
pub mod phases;
pub mod smoothing;
pub mod window;

pub use classifier::{
    determine_breathing_type, Breathing, BreathingThresholds, BreathingType, DeepExhaleRule,
    Stability,
};
pub use extrema::{Extrema, ExtremaDetector, ExtremumKind, Peak};
pub use intervals::{calculate_intervals, Interval, Intervals};
pub use phases::{current_phase, phase_spans, BreathPhase, PhaseSpan};
pub use smoothing::{display_range, moving_average, DisplayRange};
pub use window::{RingSeries, Sample, SlidingWindow};
