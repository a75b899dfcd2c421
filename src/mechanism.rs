//! Rule-based physiological mechanism detection
//!
//! The catalogue is plain data: each mechanism lists metric/direction pairs
//! that must all be present among non-negligible signals, plus supporting
//! pairs that only raise confidence. Every entry is evaluated independently,
//! so several mechanisms can fire on the same evidence.

use crate::effect_size::{EffectDirection, Magnitude};
use crate::model::{ConfidenceTier, MetricType};
use serde::{Deserialize, Serialize};

/// A single metric moving in a given direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub metric: MetricType,
    pub direction: EffectDirection,
}

const fn up(metric: MetricType) -> Condition {
    Condition {
        metric,
        direction: EffectDirection::Increase,
    }
}

const fn down(metric: MetricType) -> Condition {
    Condition {
        metric,
        direction: EffectDirection::Decrease,
    }
}

/// Catalogue entry
#[derive(Debug, Clone, Copy)]
pub struct MechanismRule {
    pub name: &'static str,
    pub description: &'static str,
    pub required: &'static [Condition],
    pub supporting: &'static [Condition],
}

pub const MECHANISM_CATALOGUE: &[MechanismRule] = &[
    MechanismRule {
        name: "Parasympathetic shift",
        description: "Higher HRV with a lower resting heart rate",
        required: &[up(MetricType::HrvRmssd), down(MetricType::RestingHeartRate)],
        supporting: &[
            up(MetricType::RecoveryScore),
            down(MetricType::RespiratoryRate),
            up(MetricType::DeepSleep),
        ],
    },
    MechanismRule {
        name: "Improved sleep architecture",
        description: "More deep sleep per night",
        required: &[up(MetricType::DeepSleep)],
        supporting: &[
            up(MetricType::RemSleep),
            up(MetricType::SleepEfficiency),
            up(MetricType::HrvRmssd),
        ],
    },
    MechanismRule {
        name: "Sleep extension",
        description: "Longer total sleep duration",
        required: &[up(MetricType::SleepDuration)],
        supporting: &[up(MetricType::RecoveryScore), up(MetricType::RemSleep)],
    },
    MechanismRule {
        name: "Sympathetic activation",
        description: "Lower HRV with an elevated resting heart rate",
        required: &[down(MetricType::HrvRmssd), up(MetricType::RestingHeartRate)],
        supporting: &[
            up(MetricType::RespiratoryRate),
            up(MetricType::SkinTemperature),
            down(MetricType::DeepSleep),
        ],
    },
    MechanismRule {
        name: "Body recomposition",
        description: "Lean mass up while body fat goes down",
        required: &[up(MetricType::LeanMass), down(MetricType::BodyFat)],
        supporting: &[up(MetricType::ActiveCalories), up(MetricType::Vo2Max)],
    },
    MechanismRule {
        name: "Fat loss",
        description: "Body weight and body fat both decreasing",
        required: &[down(MetricType::BodyWeight), down(MetricType::BodyFat)],
        supporting: &[up(MetricType::ActiveCalories), up(MetricType::Steps)],
    },
    MechanismRule {
        name: "Inflammatory response",
        description: "Raised skin temperature and resting heart rate",
        required: &[
            up(MetricType::SkinTemperature),
            up(MetricType::RestingHeartRate),
        ],
        supporting: &[
            up(MetricType::RespiratoryRate),
            down(MetricType::HrvRmssd),
            down(MetricType::RecoveryScore),
        ],
    },
    MechanismRule {
        name: "Aerobic adaptation",
        description: "Improved VO2max",
        required: &[up(MetricType::Vo2Max)],
        supporting: &[down(MetricType::RestingHeartRate), up(MetricType::HrvRmssd)],
    },
];

/// Observed effect for one metric as seen by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedSignal {
    pub metric: MetricType,
    pub direction: EffectDirection,
    pub magnitude: Magnitude,
}

/// A mechanism whose required conditions all hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedMechanism {
    pub name: String,
    pub description: String,
    pub supporting_matches: Vec<MetricType>,
    pub confidence: ConfidenceTier,
}

fn holds(condition: &Condition, signals: &[ObservedSignal]) -> bool {
    signals.iter().any(|s| {
        s.metric == condition.metric
            && s.direction == condition.direction
            && s.magnitude != Magnitude::Negligible
    })
}

/// Scan `catalogue` against the observed signals
pub fn detect_mechanisms_with(
    catalogue: &[MechanismRule],
    signals: &[ObservedSignal],
) -> Vec<DetectedMechanism> {
    catalogue
        .iter()
        .filter(|rule| rule.required.iter().all(|c| holds(c, signals)))
        .map(|rule| {
            let supporting_matches: Vec<MetricType> = rule
                .supporting
                .iter()
                .filter(|c| holds(c, signals))
                .map(|c| c.metric)
                .collect();
            let confidence = match supporting_matches.len() {
                0 => ConfidenceTier::Low,
                1 => ConfidenceTier::Medium,
                _ => ConfidenceTier::High,
            };
            DetectedMechanism {
                name: rule.name.to_string(),
                description: rule.description.to_string(),
                supporting_matches,
                confidence,
            }
        })
        .collect()
}

/// Scan the built-in [`MECHANISM_CATALOGUE`]
pub fn detect_mechanisms(signals: &[ObservedSignal]) -> Vec<DetectedMechanism> {
    detect_mechanisms_with(MECHANISM_CATALOGUE, signals)
}
