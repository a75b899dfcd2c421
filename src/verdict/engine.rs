// Ordered verdict rules, first match wins

use crate::confound::ConfoundImpact;
use crate::effect_size::{EffectDirection, EffectSizeResult, Magnitude};
use crate::model::{ConfidenceTier, MetricType, PreferredDirection};
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};

/// Whether a non-negligible effect helps or hurts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolarity {
    Positive,
    Adverse,
}

impl SignalPolarity {
    /// `None` for negligible effects; otherwise compares the effect
    /// direction with the metric's preferred direction
    pub fn of(metric: MetricType, effect: &EffectSizeResult) -> Option<Self> {
        if effect.magnitude == Magnitude::Negligible {
            return None;
        }
        match (effect.direction, metric.preferred_direction()) {
            (EffectDirection::Increase, PreferredDirection::Higher)
            | (EffectDirection::Decrease, PreferredDirection::Lower) => Some(Self::Positive),
            (EffectDirection::Increase, PreferredDirection::Lower)
            | (EffectDirection::Decrease, PreferredDirection::Higher) => Some(Self::Adverse),
            (EffectDirection::Neutral, _) => None,
        }
    }
}

/// Per-metric signal as seen by the verdict rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub metric: MetricType,
    pub magnitude: Magnitude,
    pub p_value: Option<f64>,
}

impl SignalSummary {
    pub fn from_effect(metric: MetricType, effect: &EffectSizeResult) -> Self {
        Self {
            metric,
            magnitude: effect.magnitude,
            p_value: effect.p_value,
        }
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }
}

/// Split effects into `(positive, adverse)` signals, dropping neutral ones
pub fn partition_signals<'a, I>(effects: I) -> (Vec<SignalSummary>, Vec<SignalSummary>)
where
    I: IntoIterator<Item = (MetricType, &'a EffectSizeResult)>,
{
    let mut positive = Vec::new();
    let mut adverse = Vec::new();
    for (metric, effect) in effects {
        match SignalPolarity::of(metric, effect) {
            Some(SignalPolarity::Positive) => positive.push(SignalSummary::from_effect(metric, effect)),
            Some(SignalPolarity::Adverse) => adverse.push(SignalSummary::from_effect(metric, effect)),
            None => {}
        }
    }
    (positive, adverse)
}

/// Everything the verdict rules look at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictInput {
    pub days_on_protocol: i64,
    pub positive_signals: Vec<SignalSummary>,
    pub adverse_signals: Vec<SignalSummary>,
    pub confound_impact: ConfoundImpact,
    pub confidence: ConfidenceTier,
    pub significance_level: f64,
}

/// Evaluate the verdict rules in order
///
/// 1. under 7 days: too early
/// 2. high confound impact: confounded
/// 3. under 14 days without high confidence: accumulating
/// 4. more adverse than positive signals, one of them medium or large: possible negative
/// 5. no positive signal after 14 days: no detectable effect
/// 6. positive signals graded strong, likely or weak
/// 7. otherwise accumulating before day 21, no detectable effect after
pub fn determine_verdict(input: &VerdictInput) -> Verdict {
    let days = input.days_on_protocol;

    if days < 7 {
        return Verdict::TooEarly;
    }
    if input.confound_impact == ConfoundImpact::High {
        return Verdict::Confounded;
    }
    if days < 14 && input.confidence != ConfidenceTier::High {
        return Verdict::Accumulating;
    }

    let positives = &input.positive_signals;
    let adverse = &input.adverse_signals;

    if adverse.len() > positives.len() && adverse.iter().any(|s| s.magnitude.is_medium_or_large()) {
        return Verdict::PossibleNegative;
    }
    if positives.is_empty() && days >= 14 {
        return Verdict::NoDetectableEffect;
    }

    if let Some(strongest) = positives.iter().map(|s| s.magnitude).max() {
        let any_significant = positives
            .iter()
            .any(|s| s.is_significant(input.significance_level));

        return match strongest {
            Magnitude::Large
                if input.confidence == ConfidenceTier::High || any_significant =>
            {
                Verdict::StrongPositive
            }
            Magnitude::Medium => Verdict::LikelyPositive,
            Magnitude::Large if input.confidence != ConfidenceTier::Low => {
                Verdict::LikelyPositive
            }
            _ => Verdict::WeakPositive,
        };
    }

    if days < 21 {
        Verdict::Accumulating
    } else {
        Verdict::NoDetectableEffect
    }
}
