// Severity-weighted confound impact assessment

use super::Confounder;
use crate::model::DateRange;
use crate::stats::safe_divide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Heaviest weight in the severity table; one illness every day scores 100
const MAX_SEVERITY_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfoundImpact {
    None,
    Low,
    Medium,
    High,
}

/// Aggregate confound load over the post-period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfoundAssessment {
    pub confounders: Vec<Confounder>,
    /// Distinct post-period days carrying a day-level confound
    pub confounded_days: usize,
    /// `confounded_days / days_on_protocol`
    pub day_ratio: f64,
    /// Sum of affected post-period days times severity weight
    pub weighted_score: f64,
    /// Weighted score normalized to 0-100
    pub normalized_score: f64,
    pub impact: ConfoundImpact,
}

/// Score the confounds that fall inside `post_period`
///
/// Both ratios are taken over the inclusive post-period day count, so a
/// confound on every day scores exactly its severity share. Calendar-derived
/// confounds (seasonal, protocol overlap) contribute to the weighted score
/// only; the day ratio counts annotated days.
pub fn assess_impact(confounders: Vec<Confounder>, post_period: DateRange) -> ConfoundAssessment {
    let mut confounded: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut weighted_score = 0.0;

    for confounder in &confounders {
        let weight = confounder.confound_type.severity_weight();
        if confounder.confound_type.is_day_level() {
            let in_post = confounder.days_within(post_period);
            weighted_score += in_post.len() as f64 * weight;
            confounded.extend(in_post);
        } else {
            weighted_score += confounder.count_within(post_period) as f64 * weight;
        }
    }

    let days = post_period.len_days() as f64;
    let day_ratio = safe_divide(confounded.len() as f64, days);
    let normalized_score =
        (safe_divide(weighted_score, days * MAX_SEVERITY_WEIGHT) * 100.0).clamp(0.0, 100.0);

    let impact = if day_ratio > 0.4 || normalized_score > 50.0 {
        ConfoundImpact::High
    } else if day_ratio > 0.2 || normalized_score > 25.0 {
        ConfoundImpact::Medium
    } else if !confounders.is_empty() {
        ConfoundImpact::Low
    } else {
        ConfoundImpact::None
    };

    ConfoundAssessment {
        confounders,
        confounded_days: confounded.len(),
        day_ratio,
        weighted_score,
        normalized_score,
        impact,
    }
}
