//! # Breath Pattern Core Library
//!
//! Streaming analysis of a one-dimensional breathing signal. Each sample pushed
//! into a [`engine::BreathingEngine`] updates fixed-capacity sample, smoothed and
//! deviation buffers, re-detects the extrema of the smoothed signal, derives
//! inhale, exhale and breath-period intervals from them, and classifies the
//! breathing as normal or deep and stable or unstable. The result of every
//! sample is published as an immutable [`engine::AnalysisSnapshot`].
//!
//! ## Crate Structure
//!
//! - **`analysis`**: The pure pipeline stages: sliding window, moving-average
//!   smoothing, extrema detection, interval calculation, classification and
//!   phase layout.
//! - **`config`**: Layered configuration (defaults, TOML file, environment)
//!   using `figment`. See `config::Settings`.
//! - **`engine`**: The per-session engine tying the stages together.
//! - **`error`**: The `BreathError` enum used across the crate.
//! - **`logging`**: `tracing` subscriber setup for the command-line tool.
//! - **`source`**: The `SampleSource` trait with a synthetic generator and CSV
//!   trace replay.
//! - **`validation`**: Small checks shared by the configuration types.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod source;
pub mod validation;

pub use analysis::{Breathing, BreathingThresholds, BreathingType, Sample, Stability};
pub use config::{AnalysisConfig, SampleValidation, Settings};
pub use engine::{AnalysisSnapshot, BreathingEngine};
pub use error::{BreathError, BreathResult};
