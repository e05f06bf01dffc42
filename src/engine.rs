//! Per-session analysis engine.
//!
//! [`BreathingEngine::ingest`] runs one synchronous pass per sample:
//!
//! ```text
//! sample -> window (raw, smoothed, deviation, timestamp)
//!        -> extrema over the whole smoothed buffer
//!        -> intervals -> classification -> phases, display ranges
//!        -> Arc<AnalysisSnapshot>
//! ```
//!
//! Every pass re-derives everything from the buffers. The result is published as
//! a new `Arc<AnalysisSnapshot>`; earlier snapshots stay valid and unchanged, so
//! a renderer can keep reading one while the next sample is processed.
//!
//! # Example
//!
//! ```
//! use breath_pattern::config::AnalysisConfig;
//! use breath_pattern::engine::BreathingEngine;
//!
//! let mut engine = BreathingEngine::new(AnalysisConfig::default(), 0)?;
//! let snapshot = engine.ingest(0.02, 100)?;
//! assert_eq!(snapshot.raw.len(), 350);
//! assert!(!snapshot.breathing.kind.is_determined());
//! # Ok::<(), breath_pattern::error::BreathError>(())
//! ```

use crate::analysis::classifier::{determine_breathing_type, Breathing};
use crate::analysis::extrema::{Extrema, ExtremaDetector};
use crate::analysis::intervals::{calculate_intervals, Intervals};
use crate::analysis::phases::{current_phase, phase_spans, BreathPhase, PhaseSpan};
use crate::analysis::smoothing::{display_range, DisplayRange};
use crate::analysis::window::{Sample, SlidingWindow};
use crate::config::{AnalysisConfig, SampleValidation};
use crate::error::{BreathError, BreathResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Everything derived from the buffers after one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    /// Number of samples ingested before this snapshot was taken.
    pub sequence: u64,
    /// Raw values, oldest first.
    pub raw: Arc<[f64]>,
    /// Moving-average values, oldest first.
    pub smoothed: Arc<[f64]>,
    /// Raw minus moving average, oldest first.
    pub deviation: Arc<[f64]>,
    /// Timestamps in milliseconds, oldest first.
    pub timestamps: Arc<[i64]>,
    /// Extrema of the smoothed buffer.
    pub extrema: Extrema,
    /// Interval series derived from `extrema`.
    pub intervals: Intervals,
    /// Breathing classification.
    pub breathing: Breathing,
    /// Inhale and exhale spans for display.
    pub phases: Vec<PhaseSpan>,
    /// Phase in progress, if any extremum has been found.
    pub current_phase: Option<BreathPhase>,
    /// Display range of `raw`.
    pub raw_range: DisplayRange,
    /// Display range of `smoothed`.
    pub smoothed_range: DisplayRange,
    /// Display range of `deviation`.
    pub deviation_range: DisplayRange,
}

impl AnalysisSnapshot {
    /// Buffer capacity.
    pub fn capacity(&self) -> usize {
        self.raw.len()
    }

    /// Newest sample in the buffers, `None` before the first ingest.
    pub fn latest_sample(&self) -> Option<Sample> {
        if self.sequence == 0 {
            return None;
        }
        let value = *self.raw.last()?;
        let timestamp_ms = *self.timestamps.last()?;
        Some(Sample::new(value, timestamp_ms))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> BreathResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Streaming breathing-pattern analysis for one session.
#[derive(Debug)]
pub struct BreathingEngine {
    config: AnalysisConfig,
    window: SlidingWindow,
    detector: ExtremaDetector,
    latest: Arc<AnalysisSnapshot>,
    last_timestamp: Option<i64>,
    ingested: u64,
}

impl BreathingEngine {
    /// Create an engine whose buffers start at `origin_ms`.
    ///
    /// # Errors
    ///
    /// Returns `BreathError::Configuration` if `config` fails validation.
    pub fn new(config: AnalysisConfig, origin_ms: i64) -> BreathResult<Self> {
        config.validate()?;

        let window = SlidingWindow::new(config.capacity, config.ma_window, origin_ms);
        let detector = ExtremaDetector::from_config(&config);
        let views = window.snapshot();
        let latest = Arc::new(AnalysisSnapshot {
            sequence: 0,
            raw: views.raw,
            smoothed: views.smoothed,
            deviation: views.deviation,
            timestamps: views.timestamps,
            extrema: Extrema::default(),
            intervals: Intervals::default(),
            breathing: Breathing::calculating(),
            phases: Vec::new(),
            current_phase: None,
            raw_range: DisplayRange::default(),
            smoothed_range: DisplayRange::default(),
            deviation_range: DisplayRange::default(),
        });

        info!(
            capacity = config.capacity,
            ma_window = config.ma_window,
            peak_threshold = config.peak_threshold,
            peak_patience = config.peak_patience,
            validation = ?config.sample_validation,
            "Breathing engine created"
        );

        Ok(Self {
            config,
            window,
            detector,
            latest,
            last_timestamp: None,
            ingested: 0,
        })
    }

    /// Create an engine whose buffers start at the current wall-clock time.
    pub fn starting_now(config: AnalysisConfig) -> BreathResult<Self> {
        Self::new(config, chrono::Utc::now().timestamp_millis())
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Number of samples accepted so far.
    pub fn samples_ingested(&self) -> u64 {
        self.ingested
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<AnalysisSnapshot> {
        Arc::clone(&self.latest)
    }

    /// Ingest one sample and publish a new snapshot.
    ///
    /// # Errors
    ///
    /// With [`SampleValidation::Strict`], a non-finite value or a timestamp
    /// earlier than the previous sample is rejected; the engine state and the
    /// published snapshot are left untouched.
    pub fn ingest(&mut self, value: f64, timestamp_ms: i64) -> BreathResult<Arc<AnalysisSnapshot>> {
        self.ingest_sample(Sample::new(value, timestamp_ms))
    }

    /// [`BreathingEngine::ingest`] taking a [`Sample`].
    pub fn ingest_sample(&mut self, sample: Sample) -> BreathResult<Arc<AnalysisSnapshot>> {
        if self.config.sample_validation == SampleValidation::Strict {
            if let Err(err) = self.check(&sample) {
                warn!(error = %err, "Sample rejected");
                return Err(err);
            }
        }

        self.window.append(sample);
        self.last_timestamp = Some(sample.timestamp_ms);
        self.ingested += 1;

        let snapshot = Arc::new(self.analyze());
        self.report_changes(&snapshot);
        self.latest = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    fn check(&self, sample: &Sample) -> BreathResult<()> {
        if !sample.value.is_finite() {
            return Err(BreathError::NonFiniteSample {
                value: sample.value,
                timestamp_ms: sample.timestamp_ms,
            });
        }
        match self.last_timestamp {
            Some(previous_ms) if sample.timestamp_ms < previous_ms => {
                Err(BreathError::TimestampRegression {
                    previous_ms,
                    received_ms: sample.timestamp_ms,
                })
            }
            _ => Ok(()),
        }
    }

    fn analyze(&self) -> AnalysisSnapshot {
        let views = self.window.snapshot();
        let extrema = self.detector.detect(&views.smoothed, &views.timestamps);
        let intervals = calculate_intervals(&extrema);
        let breathing = determine_breathing_type(&intervals, &self.config.breathing);
        let phases = phase_spans(&intervals);
        let current_phase = current_phase(&extrema);

        trace!(
            sequence = self.ingested,
            maxima = extrema.maxima.len(),
            minima = extrema.minima.len(),
            "Sample analyzed"
        );

        AnalysisSnapshot {
            sequence: self.ingested,
            raw_range: display_range(&views.raw),
            smoothed_range: display_range(&views.smoothed),
            deviation_range: display_range(&views.deviation),
            raw: views.raw,
            smoothed: views.smoothed,
            deviation: views.deviation,
            timestamps: views.timestamps,
            extrema,
            intervals,
            breathing,
            phases,
            current_phase,
        }
    }

    fn report_changes(&self, next: &AnalysisSnapshot) {
        let previous = &self.latest;
        if previous.extrema.len() != next.extrema.len() {
            debug!(
                sequence = next.sequence,
                maxima = next.extrema.maxima.len(),
                minima = next.extrema.minima.len(),
                inhales = next.intervals.max_to_min.len(),
                exhales = next.intervals.min_to_max.len(),
                "Extrema changed"
            );
        }
        if previous.breathing.kind != next.breathing.kind {
            info!(
                sequence = next.sequence,
                breathing = %next.breathing.kind,
                period_s = next.breathing.period,
                detail = %next.breathing.detail,
                "Breathing classification changed"
            );
        }
    }
}
