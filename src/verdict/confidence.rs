// Additive confidence score, independent of the verdict itself

use crate::confound::ConfoundImpact;
use crate::model::ConfidenceTier;
use serde::{Deserialize, Serialize};

const BASE_SCORE: i32 = 40;
const MIN_SCORE: i32 = 20;
const MAX_SCORE: i32 = 95;
const HIGH_TIER: u8 = 70;
const MEDIUM_TIER: u8 = 45;
/// Outlier share above which the score is penalized
const OUTLIER_RATE_LIMIT: f64 = 0.10;

/// Evidence-quality facts the score is built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInputs {
    pub days_on_protocol: i64,
    pub confound_impact: ConfoundImpact,
    /// Signals whose Welch p-value is below the significance level
    pub significant_signals: usize,
    /// Signals of medium or large magnitude
    pub strong_signals: usize,
    /// Observed days over expected days, 0.0-1.0
    pub completeness: f64,
    /// Outliers removed over values seen, 0.0-1.0
    pub outlier_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub score: u8,
    pub tier: ConfidenceTier,
}

fn time_bonus(days: i64) -> i32 {
    match days {
        d if d >= 30 => 25,
        d if d >= 21 => 20,
        d if d >= 14 => 15,
        _ => 5,
    }
}

fn confound_adjustment(impact: ConfoundImpact) -> i32 {
    match impact {
        ConfoundImpact::None => 15,
        ConfoundImpact::Low => 5,
        ConfoundImpact::Medium => -5,
        ConfoundImpact::High => -15,
    }
}

fn signal_bonus(significant: usize, strong: usize) -> i32 {
    if significant >= 2 {
        15
    } else if strong >= 2 {
        10
    } else if strong == 1 {
        5
    } else {
        0
    }
}

fn completeness_bonus(completeness: f64) -> i32 {
    if completeness >= 0.8 {
        10
    } else if completeness >= 0.5 {
        5
    } else {
        0
    }
}

/// Score the evidence quality, clamped to 20-95
///
/// Tiers: 70 and above is high, 45 and above is medium.
pub fn score_confidence(inputs: &ConfidenceInputs) -> ConfidenceScore {
    let mut score = BASE_SCORE
        + time_bonus(inputs.days_on_protocol)
        + confound_adjustment(inputs.confound_impact)
        + signal_bonus(inputs.significant_signals, inputs.strong_signals)
        + completeness_bonus(inputs.completeness);
    if inputs.outlier_rate > OUTLIER_RATE_LIMIT {
        score -= 5;
    }

    let score = score.clamp(MIN_SCORE, MAX_SCORE) as u8;
    let tier = if score >= HIGH_TIER {
        ConfidenceTier::High
    } else if score >= MEDIUM_TIER {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    };

    ConfidenceScore { score, tier }
}
