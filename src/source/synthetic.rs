//! Deterministic synthetic breathing signal.
//!
//! Stands in for a sensor during development and demos. The waveform is a
//! periodic triangle (or sine) with optional uniform noise from a seeded RNG,
//! so two sources built from the same configuration produce identical samples.
use crate::analysis::window::Sample;
use crate::error::{BreathError, BreathResult};
use crate::source::SampleSource;
use crate::validation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Shape of one breath cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Linear rise to `+amplitude`, fall to `-amplitude`, rise back to 0.
    #[default]
    Triangle,
    /// `amplitude * sin(2π x)`.
    Sine,
}

/// Synthetic source parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Waveform shape.
    pub waveform: Waveform,
    /// Breath period in seconds.
    pub period_s: f64,
    /// Peak amplitude.
    pub amplitude: f64,
    /// Constant added to every value.
    pub offset: f64,
    /// Starting position within the cycle, as a fraction of the period.
    pub phase: f64,
    /// Half-width of the uniform noise added to every value. 0 disables noise.
    pub noise: f64,
    /// Spacing between samples in milliseconds.
    pub sample_interval_ms: u64,
    /// Timestamp the stream starts from; the first sample is one interval later.
    pub start_ms: i64,
    /// Number of samples to produce; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
    /// Noise RNG seed.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Triangle,
            period_s: 8.0,
            amplitude: 1.0,
            offset: 0.0,
            phase: 0.0,
            noise: 0.0,
            sample_interval_ms: 100,
            start_ms: 0,
            samples: None,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Check that the parameters describe a usable signal.
    pub fn validate(&self) -> BreathResult<()> {
        let invalid =
            |field: &str, reason: &str| BreathError::Configuration(format!("source.{field}: {reason}"));

        validation::is_positive_finite(self.period_s).map_err(|e| invalid("period_s", e))?;
        validation::is_non_negative_finite(self.amplitude).map_err(|e| invalid("amplitude", e))?;
        validation::is_non_negative_finite(self.noise).map_err(|e| invalid("noise", e))?;
        if !self.offset.is_finite() {
            return Err(invalid("offset", "must be finite"));
        }
        if !self.phase.is_finite() {
            return Err(invalid("phase", "must be finite"));
        }
        if self.sample_interval_ms == 0 {
            return Err(invalid("sample_interval_ms", "must be greater than zero"));
        }
        Ok(())
    }

    /// Sample count covering `cycles` whole breaths.
    pub fn samples_for_cycles(&self, cycles: f64) -> u64 {
        (cycles * self.period_s * 1000.0 / self.sample_interval_ms as f64).ceil() as u64
    }
}

/// Noise-free waveform value at `t_s` seconds, before `offset` is applied.
pub fn waveform_value(waveform: Waveform, t_s: f64, period_s: f64, phase: f64, amplitude: f64) -> f64 {
    let x = (t_s / period_s + phase).rem_euclid(1.0);
    match waveform {
        Waveform::Triangle => {
            if x < 0.25 {
                amplitude * x * 4.0
            } else if x < 0.75 {
                amplitude * (1.0 - (x - 0.25) * 4.0)
            } else {
                amplitude * (-1.0 + (x - 0.75) * 4.0)
            }
        }
        Waveform::Sine => amplitude * (TAU * x).sin(),
    }
}

/// Synthetic breathing source.
#[derive(Debug, Clone)]
pub struct SyntheticBreath {
    config: SyntheticConfig,
    rng: StdRng,
    produced: u64,
}

impl SyntheticBreath {
    /// Create a source, validating `config`.
    pub fn new(config: SyntheticConfig) -> BreathResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            rng,
            produced: 0,
        })
    }

    /// Source configuration.
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Samples produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    fn sample_at(&mut self, k: u64) -> Sample {
        let c = &self.config;
        let t_s = (k * c.sample_interval_ms) as f64 / 1000.0;
        let mut value = c.offset + waveform_value(c.waveform, t_s, c.period_s, c.phase, c.amplitude);
        if c.noise > 0.0 {
            value += self.rng.gen_range(-c.noise..=c.noise);
        }
        let timestamp_ms = c.start_ms + ((k + 1) * c.sample_interval_ms) as i64;
        Sample::new(value, timestamp_ms)
    }
}

impl SampleSource for SyntheticBreath {
    fn next_sample(&mut self) -> Option<BreathResult<Sample>> {
        if self.config.samples.is_some_and(|limit| self.produced >= limit) {
            return None;
        }
        let sample = self.sample_at(self.produced);
        self.produced += 1;
        Some(Ok(sample))
    }

    fn nominal_interval_ms(&self) -> u64 {
        self.config.sample_interval_ms
    }

    fn describe(&self) -> String {
        format!(
            "synthetic {:?} wave, period {}s, amplitude {}",
            self.config.waveform, self.config.period_s, self.config.amplitude
        )
    }
}

impl Iterator for SyntheticBreath {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        self.next_sample().and_then(Result::ok)
    }
}
