// Verdict Engine
//
// Two independent axes summarize the evidence for a protocol:
//
// - A confidence score (20-95) built from elapsed time, confound load,
//   signal strength, data completeness and the outlier rate.
// - A categorical verdict evaluated from scratch on every run by an ordered
//   rule list where the first matching rule wins.
//
// Nothing here is persisted between runs. Lifecycle state lives in the
// evidence ledger instead.

mod confidence;
mod engine;

pub use confidence::{score_confidence, ConfidenceInputs, ConfidenceScore};
pub use engine::{
    determine_verdict, partition_signals, SignalPolarity, SignalSummary, VerdictInput,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical conclusion about a protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    TooEarly,
    Accumulating,
    WeakPositive,
    LikelyPositive,
    StrongPositive,
    NoDetectableEffect,
    PossibleNegative,
    Confounded,
}

/// Coarse grouping used to compare verdicts across scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictBucket {
    Positive,
    Negative,
    Neutral,
}

impl Verdict {
    pub fn bucket(self) -> VerdictBucket {
        match self {
            Verdict::WeakPositive | Verdict::LikelyPositive | Verdict::StrongPositive => {
                VerdictBucket::Positive
            }
            Verdict::PossibleNegative => VerdictBucket::Negative,
            Verdict::TooEarly
            | Verdict::Accumulating
            | Verdict::NoDetectableEffect
            | Verdict::Confounded => VerdictBucket::Neutral,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::TooEarly => "too_early",
            Verdict::Accumulating => "accumulating",
            Verdict::WeakPositive => "weak_positive",
            Verdict::LikelyPositive => "likely_positive",
            Verdict::StrongPositive => "strong_positive",
            Verdict::NoDetectableEffect => "no_detectable_effect",
            Verdict::PossibleNegative => "possible_negative",
            Verdict::Confounded => "confounded",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
