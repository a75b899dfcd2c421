// Confound Detection
//
// Finds external factors that could explain a metric change independently of
// the protocol. Three strategies run side by side and their findings are
// simply concatenated:
//
// 1. Keyword matching over daily notes (plus pre-extracted events). A day
//    maps to at most one category; the first category in KEYWORD_TABLE order
//    wins, so the table order is part of the contract.
// 2. Seasonal shift between the pre-period and post-period start dates.
// 3. Overlap with any other protocol that starts inside the observation window.
//
// The impact assessment weighs confounded days by severity and buckets the
// result into none/low/medium/high.

mod detector;
mod impact;
mod keywords;

pub use detector::{
    detect_protocol_overlap, detect_seasonal_shift, season_index, ConfoundDetector,
    ConfoundEvent, ObservationWindow,
};
pub use impact::{assess_impact, ConfoundAssessment, ConfoundImpact};
pub use keywords::{KeywordMatcher, KEYWORD_TABLE};

use crate::model::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a detected confound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfoundType {
    Illness,
    Travel,
    Alcohol,
    Stress,
    Seasonal,
    ProtocolOverlap,
}

impl ConfoundType {
    /// Severity weight used by the impact score; unweighted types default to 0.5
    pub fn severity_weight(self) -> f64 {
        match self {
            ConfoundType::Illness => 2.0,
            ConfoundType::Travel => 1.5,
            ConfoundType::Alcohol => 1.0,
            ConfoundType::Stress => 0.5,
            ConfoundType::Seasonal | ConfoundType::ProtocolOverlap => 0.5,
        }
    }

    /// Whether this confound is tied to specific annotated days
    pub fn is_day_level(self) -> bool {
        matches!(
            self,
            ConfoundType::Illness
                | ConfoundType::Travel
                | ConfoundType::Alcohol
                | ConfoundType::Stress
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfoundType::Illness => "illness",
            ConfoundType::Travel => "travel",
            ConfoundType::Alcohol => "alcohol",
            ConfoundType::Stress => "stress",
            ConfoundType::Seasonal => "seasonal",
            ConfoundType::ProtocolOverlap => "protocol_overlap",
        }
    }
}

impl fmt::Display for ConfoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a confound moves the metric, as estimated by the causal adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactDirection {
    Raises,
    Lowers,
    Unknown,
}

/// A detected confound. Evidence, not ground truth.
///
/// Annotated confounds list their days; calendar-derived ones cover a
/// contiguous `span`. `estimated_impact` is 0 until the causal adjustment
/// engine fills it in from its regression coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confounder {
    pub name: String,
    pub confound_type: ConfoundType,
    /// Sorted, de-duplicated days the confound applies to
    #[serde(default)]
    pub affected_days: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<DateRange>,
    pub estimated_impact: f64,
    pub direction: ImpactDirection,
}

impl Confounder {
    pub fn new(name: impl Into<String>, confound_type: ConfoundType, mut days: Vec<NaiveDate>) -> Self {
        days.sort();
        days.dedup();
        Self {
            name: name.into(),
            confound_type,
            affected_days: days,
            span: None,
            estimated_impact: 0.0,
            direction: ImpactDirection::Unknown,
        }
    }

    /// Confound covering every day of `range`
    pub fn spanning(name: impl Into<String>, confound_type: ConfoundType, range: DateRange) -> Self {
        Self {
            span: Some(range),
            ..Self::new(name, confound_type, Vec::new())
        }
    }

    pub fn affects(&self, date: NaiveDate) -> bool {
        self.span.is_some_and(|span| span.contains(date))
            || self.affected_days.binary_search(&date).is_ok()
    }

    /// Affected days that fall inside `range`, in date order
    pub fn days_within(&self, range: DateRange) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self
            .affected_days
            .iter()
            .copied()
            .filter(|d| range.contains(*d))
            .collect();
        if let Some(overlap) = self.span.and_then(|span| span.intersect(&range)) {
            days.extend(overlap.days());
            days.sort();
            days.dedup();
        }
        days
    }

    /// Number of affected days inside `range`
    pub fn count_within(&self, range: DateRange) -> usize {
        match self.span.and_then(|span| span.intersect(&range)) {
            Some(overlap) => {
                let outside_span = self
                    .affected_days
                    .iter()
                    .filter(|d| range.contains(**d) && !overlap.contains(**d))
                    .count();
                overlap.len_days() + outside_span
            }
            None => self.affected_days.iter().filter(|d| range.contains(**d)).count(),
        }
    }
}
