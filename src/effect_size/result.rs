// Value objects produced by the effect-size engine

use serde::{Deserialize, Serialize};

/// Conventional Cohen's d magnitude bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl Magnitude {
    /// Classify `|d|`: <0.2 negligible, <0.5 small, <0.8 medium, else large
    pub fn from_cohens_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Magnitude::Negligible
        } else if d < 0.5 {
            Magnitude::Small
        } else if d < 0.8 {
            Magnitude::Medium
        } else {
            Magnitude::Large
        }
    }

    pub fn is_medium_or_large(self) -> bool {
        matches!(self, Magnitude::Medium | Magnitude::Large)
    }
}

/// Raw direction of the post-period shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDirection {
    Increase,
    Decrease,
    /// Negligible magnitude, including an exact zero
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Effect-size statistics for one before/after comparison
///
/// `t_value`, `p_value` and `degrees_of_freedom` are only present when both
/// cleaned samples hold at least five values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSizeResult {
    pub cohens_d: f64,
    pub percent_change: f64,
    pub absolute_change: f64,
    pub standard_error: f64,
    pub confidence_interval: ConfidenceInterval,
    pub t_value: Option<f64>,
    pub p_value: Option<f64>,
    pub degrees_of_freedom: Option<f64>,
    pub power_estimate: f64,
    pub magnitude: Magnitude,
    pub direction: EffectDirection,
    pub before_mean: f64,
    pub after_mean: f64,
    pub before_n: usize,
    pub after_n: usize,
    /// Values dropped by the 1.5 x IQR pre-cleaning across both samples
    pub outliers_removed: usize,
}

impl EffectSizeResult {
    /// All-zero result used when either sample is empty
    pub fn empty() -> Self {
        Self {
            cohens_d: 0.0,
            percent_change: 0.0,
            absolute_change: 0.0,
            standard_error: 0.0,
            confidence_interval: ConfidenceInterval::default(),
            t_value: None,
            p_value: None,
            degrees_of_freedom: None,
            power_estimate: 0.0,
            magnitude: Magnitude::Negligible,
            direction: EffectDirection::Neutral,
            before_mean: 0.0,
            after_mean: 0.0,
            before_n: 0,
            after_n: 0,
            outliers_removed: 0,
        }
    }

    /// Whether the Welch p-value exists and falls below `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }
}
