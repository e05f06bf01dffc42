//! Configuration loading using Figment.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults (the reference analysis parameters)
//! 2. A TOML file (`config/breath_pattern.toml` unless another path is given)
//! 3. Environment variables prefixed with `BREATH_PATTERN_`, using `__` between
//!    nested keys (e.g. `BREATH_PATTERN_ANALYSIS__CAPACITY=450`)
//!
//! The analysis parameters are fixed once an engine has been constructed.
//!
//! # Example
//! ```no_run
//! use breath_pattern::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Window capacity: {}", settings.analysis.capacity);
//! # Ok::<(), breath_pattern::error::BreathError>(())
//! ```

use crate::analysis::classifier::BreathingThresholds;
use crate::error::{BreathError, BreathResult};
use crate::logging::LogFormat;
use crate::source::synthetic::SyntheticConfig;
use crate::validation;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/breath_pattern.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "BREATH_PATTERN_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application settings
    pub application: ApplicationConfig,
    /// Analysis engine parameters
    pub analysis: AnalysisConfig,
    /// Synthetic sample source used by `breath-pattern simulate`
    pub source: SyntheticConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "breath-pattern".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// What `ingest` does with samples that break the input contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleValidation {
    /// Reject non-finite values and timestamps that go backwards.
    #[default]
    Strict,
    /// Accept everything. A NaN then suppresses extrema in every comparison
    /// window that contains it until it has been evicted.
    Passthrough,
}

/// Parameters of the streaming analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of samples kept in every sliding buffer.
    pub capacity: usize,
    /// Number of trailing raw samples averaged into each smoothed sample.
    pub ma_window: usize,
    /// Minimum absolute smoothed value for an extremum.
    pub peak_threshold: f64,
    /// Minimum index spacing between extrema of the same kind, and the
    /// half-width of the comparison window.
    pub peak_patience: usize,
    /// Breathing classification thresholds.
    pub breathing: BreathingThresholds,
    /// Handling of malformed samples at ingest.
    pub sample_validation: SampleValidation,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            capacity: 350,
            ma_window: 50,
            peak_threshold: 0.1,
            peak_patience: 27,
            breathing: BreathingThresholds::default(),
            sample_validation: SampleValidation::Strict,
        }
    }
}

impl AnalysisConfig {
    /// Check that the parameters describe a usable engine.
    pub fn validate(&self) -> BreathResult<()> {
        let invalid = |field: &str, reason: &str| {
            BreathError::Configuration(format!("analysis.{field}: {reason}"))
        };

        validation::is_non_zero(self.capacity).map_err(|e| invalid("capacity", e))?;
        validation::is_in_range(self.ma_window, 1..=self.capacity).map_err(|_| {
            invalid(
                "ma_window",
                &format!("must be between 1 and capacity ({})", self.capacity),
            )
        })?;
        validation::is_non_negative_finite(self.peak_threshold)
            .map_err(|e| invalid("peak_threshold", e))?;
        validation::is_non_zero(self.peak_patience).map_err(|e| invalid("peak_patience", e))?;
        if self.capacity < 2 * self.peak_patience + 1 {
            return Err(invalid(
                "peak_patience",
                &format!(
                    "comparison window ({}) does not fit in capacity ({})",
                    2 * self.peak_patience + 1,
                    self.capacity
                ),
            ));
        }
        self.breathing.validate()
    }
}

impl Settings {
    /// Load settings from the default file (if present) and the environment.
    pub fn load() -> BreathResult<Self> {
        let settings: Settings = figment(None).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific TOML file and the environment.
    ///
    /// Unlike [`Settings::load`], a missing file is an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> BreathResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BreathError::Configuration(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        let settings: Settings = figment(Some(path)).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml_string(&self) -> BreathResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BreathError::Configuration(format!("cannot render settings: {e}")))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> BreathResult<()> {
        validation::is_valid_log_level(&self.application.log_level)
            .map_err(|e| BreathError::Configuration(format!("application.log_level: {e}")))?;
        self.analysis.validate()?;
        self.source.validate()
    }
}

fn figment(path: Option<&Path>) -> Figment {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::DeepExhaleRule;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_reference_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.capacity, 350);
        assert_eq!(config.ma_window, 50);
        assert_eq!(config.peak_threshold, 0.1);
        assert_eq!(config.peak_patience, 27);
        assert_eq!(config.breathing.recent_breaths, 3);
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
            [application]
            log_level = "debug"

            [analysis]
            capacity = 450

            [analysis.breathing.deep_exhale]
            rule = "at_least"
            seconds = 3.5
            "#,
        );

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.application.log_level, "debug");
        assert_eq!(settings.analysis.capacity, 450);
        assert_eq!(settings.analysis.ma_window, 50);
        assert_eq!(
            settings.analysis.breathing.deep_exhale,
            DeepExhaleRule::AtLeast { seconds: 3.5 }
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Settings::load_from("/nonexistent/breath_pattern.toml");
        assert!(matches!(result, Err(BreathError::Configuration(_))));
    }

    #[test]
    fn test_wrong_type_is_a_config_error() {
        let file = write_config("[analysis]\ncapacity = \"large\"\n");
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(BreathError::Config(_))
        ));
    }

    #[test]
    fn test_rendered_settings_load_back() {
        let mut settings = Settings::default();
        settings.analysis.capacity = 450;
        settings.source.samples = Some(600);

        let file = write_config(&settings.to_toml_string().unwrap());
        assert_eq!(Settings::load_from(file.path()).unwrap(), settings);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.application.log_level = "verbose".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_ma_window_larger_than_capacity() {
        let config = AnalysisConfig {
            capacity: 40,
            ma_window: 41,
            peak_patience: 5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ma_window"));
    }

    #[test]
    fn test_patience_window_must_fit() {
        let config = AnalysisConfig {
            capacity: 54,
            ma_window: 10,
            peak_patience: 27,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            capacity: 55,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = AnalysisConfig {
            peak_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
