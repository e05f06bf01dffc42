//! Custom error types for the crate.
//!
//! This module defines the primary error type, `BreathError`. Using the `thiserror`
//! crate, it provides a single, consistent way to report the few things that can go
//! wrong around the analysis engine: loading configuration, reading recorded traces,
//! and samples that violate the input contract.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from `figment`, typically TOML syntax problems or a
//!   field with the wrong type.
//! - **`Configuration`**: Semantic errors in a configuration that parsed fine but is
//!   logically unusable (e.g. a moving-average window larger than the buffer).
//! - **`Io`** / **`Csv`**: Failures while reading a recorded trace from disk.
//! - **`Serialization`**: JSON encoding of snapshots for `--json` output.
//! - **`NonFiniteSample`** / **`TimestampRegression`**: Samples rejected at ingest
//!   when strict sample validation is enabled.
//! - **`FeatureNotEnabled`**: Functionality that was compiled out via feature flags.
//!
//! The analysis core itself never fails: insufficient history is reported as a
//! `Calculating` classification, not as an error.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type BreathResult<T> = std::result::Result<T, BreathError>;

/// Errors produced by configuration loading, sample sources and sample validation.
#[derive(Error, Debug)]
pub enum BreathError {
    /// The configuration could not be parsed or extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The configuration parsed but contains unusable values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// I/O failure, usually while opening a recorded trace.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A recorded trace could not be decoded.
    #[cfg(feature = "csv_replay")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A snapshot or summary could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A sample value was NaN or infinite.
    #[error("Rejected non-finite sample {value} at {timestamp_ms} ms")]
    NonFiniteSample {
        /// The offending value.
        value: f64,
        /// Timestamp of the offending sample.
        timestamp_ms: i64,
    },

    /// A sample arrived with a timestamp earlier than the previous one.
    #[error("Rejected sample at {received_ms} ms: earlier than previous sample at {previous_ms} ms")]
    TimestampRegression {
        /// Timestamp of the most recently accepted sample.
        previous_ms: i64,
        /// Timestamp of the rejected sample.
        received_ms: i64,
    },

    /// A sample source failed for a reason not covered above.
    #[error("Sample source error: {0}")]
    Source(String),

    /// The requested functionality was not compiled in.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),
}

impl From<figment::Error> for BreathError {
    fn from(value: figment::Error) -> Self {
        BreathError::Config(Box::new(value))
    }
}

impl BreathError {
    /// Whether the stream can continue after this error.
    ///
    /// Rejected samples only drop the offending sample; everything else ends the run.
    pub fn is_sample_rejection(&self) -> bool {
        matches!(
            self,
            BreathError::NonFiniteSample { .. } | BreathError::TimestampRegression { .. }
        )
    }
}
