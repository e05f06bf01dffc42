//! Breathing Classifier.
//!
//! A pure function of the most recent inhale and exhale durations: nothing is
//! carried over between calls.
use crate::analysis::intervals::Intervals;
use crate::error::{BreathError, BreathResult};
use crate::validation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether recent breaths have consistent durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    /// Inhale and exhale standard deviations are both below the threshold.
    Stable,
    /// At least one standard deviation reaches the threshold.
    Unstable,
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stability::Stable => write!(f, "Stable"),
            Stability::Unstable => write!(f, "Unstable"),
        }
    }
}

/// Breathing verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreathingType {
    /// Not enough inhales and exhales yet.
    Calculating,
    /// Ordinary breathing.
    Normal(Stability),
    /// Long inhales with exhales inside the configured bound.
    Deep(Stability),
}

impl BreathingType {
    /// Stability qualifier, if a verdict has been reached.
    pub fn stability(&self) -> Option<Stability> {
        match self {
            BreathingType::Calculating => None,
            BreathingType::Normal(s) | BreathingType::Deep(s) => Some(*s),
        }
    }

    /// True once enough breaths have been seen for a verdict.
    pub fn is_determined(&self) -> bool {
        !matches!(self, BreathingType::Calculating)
    }
}

impl fmt::Display for BreathingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreathingType::Calculating => write!(f, "Calculating..."),
            BreathingType::Normal(s) => write!(f, "Normal breathing ({s})"),
            BreathingType::Deep(s) => write!(f, "Deep breathing ({s})"),
        }
    }
}

/// Classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breathing {
    /// The verdict.
    pub kind: BreathingType,
    /// Average inhale plus average exhale, in seconds. Zero while calculating.
    pub period: f64,
    /// Human-readable averages. Empty while calculating.
    pub detail: String,
}

impl Breathing {
    /// The result reported before enough breaths have been seen.
    pub fn calculating() -> Self {
        Self {
            kind: BreathingType::Calculating,
            period: 0.0,
            detail: String::new(),
        }
    }

    /// Breaths per minute implied by `period`, if any.
    pub fn rate_per_minute(&self) -> Option<f64> {
        (self.period > 0.0).then(|| 60.0 / self.period)
    }
}

impl Default for Breathing {
    fn default() -> Self {
        Self::calculating()
    }
}

/// Condition on the average exhale for a deep-breath verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DeepExhaleRule {
    /// Average exhale must not exceed `seconds`.
    AtMost {
        /// Upper bound in seconds.
        seconds: f64,
    },
    /// Average exhale must be at least `seconds`.
    AtLeast {
        /// Lower bound in seconds.
        seconds: f64,
    },
}

impl DeepExhaleRule {
    /// Whether `avg_exhale` satisfies the rule.
    pub fn admits(&self, avg_exhale: f64) -> bool {
        match *self {
            DeepExhaleRule::AtMost { seconds } => avg_exhale <= seconds,
            DeepExhaleRule::AtLeast { seconds } => avg_exhale >= seconds,
        }
    }

    /// The bound in seconds.
    pub fn seconds(&self) -> f64 {
        match *self {
            DeepExhaleRule::AtMost { seconds } | DeepExhaleRule::AtLeast { seconds } => seconds,
        }
    }
}

impl Default for DeepExhaleRule {
    fn default() -> Self {
        DeepExhaleRule::AtMost { seconds: 4.0 }
    }
}

/// Thresholds used by [`determine_breathing_type`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingThresholds {
    /// Minimum average inhale, in seconds, for a deep-breath verdict.
    pub deep_inhale_min: f64,
    /// Exhale condition for a deep-breath verdict.
    pub deep_exhale: DeepExhaleRule,
    /// Standard deviation, in seconds, below which breathing counts as stable.
    pub stability_threshold: f64,
    /// Number of most recent inhales and exhales considered.
    pub recent_breaths: usize,
}

impl Default for BreathingThresholds {
    fn default() -> Self {
        Self {
            deep_inhale_min: 3.0,
            deep_exhale: DeepExhaleRule::default(),
            stability_threshold: 0.4,
            recent_breaths: 3,
        }
    }
}

impl BreathingThresholds {
    /// Check that the thresholds are usable.
    pub fn validate(&self) -> BreathResult<()> {
        let invalid = |field: &str, reason: &str| {
            BreathError::Configuration(format!("analysis.breathing.{field}: {reason}"))
        };
        validation::is_non_negative_finite(self.deep_inhale_min)
            .map_err(|e| invalid("deep_inhale_min", e))?;
        validation::is_non_negative_finite(self.deep_exhale.seconds())
            .map_err(|e| invalid("deep_exhale.seconds", e))?;
        validation::is_positive_finite(self.stability_threshold)
            .map_err(|e| invalid("stability_threshold", e))?;
        validation::is_non_zero(self.recent_breaths).map_err(|e| invalid("recent_breaths", e))
    }
}

/// Population standard deviation of `values` around `mean`.
pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Classify the latest breaths in `intervals`.
pub fn determine_breathing_type(intervals: &Intervals, thresholds: &BreathingThresholds) -> Breathing {
    classify(
        &intervals.inhale_durations(),
        &intervals.exhale_durations(),
        thresholds,
    )
}

/// Classify from inhale and exhale durations in seconds, oldest first.
///
/// Only the last `recent_breaths` of each are used. Fewer than that in either
/// series gives [`Breathing::calculating`].
pub fn classify(inhales: &[f64], exhales: &[f64], thresholds: &BreathingThresholds) -> Breathing {
    let n = thresholds.recent_breaths;
    if n == 0 || inhales.len() < n || exhales.len() < n {
        return Breathing::calculating();
    }

    let recent_inhales = &inhales[inhales.len() - n..];
    let recent_exhales = &exhales[exhales.len() - n..];

    let avg_inhale = recent_inhales.iter().sum::<f64>() / n as f64;
    let avg_exhale = recent_exhales.iter().sum::<f64>() / n as f64;

    let inhale_std_dev = population_std_dev(recent_inhales, avg_inhale);
    let exhale_std_dev = population_std_dev(recent_exhales, avg_exhale);
    let stability = if inhale_std_dev < thresholds.stability_threshold
        && exhale_std_dev < thresholds.stability_threshold
    {
        Stability::Stable
    } else {
        Stability::Unstable
    };

    let kind = if avg_inhale >= thresholds.deep_inhale_min
        && thresholds.deep_exhale.admits(avg_exhale)
    {
        BreathingType::Deep(stability)
    } else {
        BreathingType::Normal(stability)
    };

    Breathing {
        kind,
        period: avg_inhale + avg_exhale,
        detail: format!("avg inhale: {avg_inhale:.1}s, avg exhale: {avg_exhale:.1}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> BreathingThresholds {
        BreathingThresholds::default()
    }

    #[test]
    fn too_few_breaths_is_calculating() {
        let result = classify(&[5.0, 5.0], &[5.0, 5.0, 5.0], &thresholds());
        assert_eq!(result.kind, BreathingType::Calculating);
        assert_eq!(result.period, 0.0);
        assert!(result.detail.is_empty());

        let result = classify(&[5.0, 5.0, 5.0], &[5.0], &thresholds());
        assert_eq!(result, Breathing::calculating());
    }

    #[test]
    fn identical_breaths_are_stable() {
        let result = classify(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], &thresholds());
        assert_eq!(result.kind.stability(), Some(Stability::Stable));
        assert_eq!(result.period, 10.0);
        assert_eq!(result.detail, "avg inhale: 5.0s, avg exhale: 5.0s");
        assert_eq!(result.rate_per_minute(), Some(6.0));
    }

    #[test]
    fn varying_breaths_are_unstable() {
        let result = classify(&[2.0, 6.0, 2.0], &[5.0, 5.0, 5.0], &thresholds());
        assert_eq!(result.kind.stability(), Some(Stability::Unstable));

        let result = classify(&[5.0, 5.0, 5.0], &[2.0, 6.0, 2.0], &thresholds());
        assert_eq!(result.kind.stability(), Some(Stability::Unstable));
    }

    #[test]
    fn only_the_latest_breaths_count() {
        let result = classify(
            &[9.0, 1.0, 2.0, 2.0, 2.0],
            &[7.0, 2.0, 2.0, 2.0],
            &thresholds(),
        );
        assert_eq!(result.kind, BreathingType::Normal(Stability::Stable));
        assert_eq!(result.period, 4.0);
    }

    #[test]
    fn stability_threshold_is_strict() {
        // Population std-dev of [1.0, 1.5, 2.0] is about 0.408.
        let result = classify(&[1.0, 1.5, 2.0], &[2.0, 2.0, 2.0], &thresholds());
        assert_eq!(result.kind.stability(), Some(Stability::Unstable));

        let relaxed = BreathingThresholds {
            stability_threshold: 0.41,
            ..thresholds()
        };
        let result = classify(&[1.0, 1.5, 2.0], &[2.0, 2.0, 2.0], &relaxed);
        assert_eq!(result.kind.stability(), Some(Stability::Stable));
    }

    #[test]
    fn deep_with_default_at_most_rule() {
        let result = classify(&[3.5, 3.5, 3.5], &[3.0, 3.0, 3.0], &thresholds());
        assert_eq!(result.kind, BreathingType::Deep(Stability::Stable));

        // Exhale longer than 4 s fails the default bound.
        let result = classify(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], &thresholds());
        assert_eq!(result.kind, BreathingType::Normal(Stability::Stable));

        // Short inhale is never deep.
        let result = classify(&[2.9, 2.9, 2.9], &[3.0, 3.0, 3.0], &thresholds());
        assert_eq!(result.kind, BreathingType::Normal(Stability::Stable));
    }

    #[test]
    fn deep_with_at_least_rule() {
        let at_least = BreathingThresholds {
            deep_exhale: DeepExhaleRule::AtLeast { seconds: 4.0 },
            ..thresholds()
        };
        let result = classify(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], &at_least);
        assert_eq!(result.kind, BreathingType::Deep(Stability::Stable));

        let result = classify(&[5.0, 5.0, 5.0], &[3.0, 3.0, 3.0], &at_least);
        assert_eq!(result.kind, BreathingType::Normal(Stability::Stable));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let result = classify(&[3.0, 3.0, 3.0], &[4.0, 4.0, 4.0], &thresholds());
        assert_eq!(result.kind, BreathingType::Deep(Stability::Stable));
    }

    #[test]
    fn std_dev_is_population() {
        assert_eq!(population_std_dev(&[2.0, 4.0], 3.0), 1.0);
        assert_eq!(population_std_dev(&[], 0.0), 0.0);
        assert!((population_std_dev(&[2.0, 6.0, 2.0], 10.0 / 3.0) - 1.8856).abs() < 1e-4);
    }

    #[test]
    fn display_names() {
        assert_eq!(BreathingType::Calculating.to_string(), "Calculating...");
        assert_eq!(
            BreathingType::Deep(Stability::Unstable).to_string(),
            "Deep breathing (Unstable)"
        );
        assert!(!BreathingType::Calculating.is_determined());
    }

    #[test]
    fn thresholds_validation() {
        assert!(thresholds().validate().is_ok());
        let bad = BreathingThresholds {
            recent_breaths: 0,
            ..thresholds()
        };
        assert!(bad.validate().is_err());
        let bad = BreathingThresholds {
            stability_threshold: 0.0,
            ..thresholds()
        };
        assert!(bad.validate().is_err());
    }
}
