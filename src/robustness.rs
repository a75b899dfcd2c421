//! Verdict stability under input perturbations
//!
//! The verdict is re-derived for three scenarios and each result is reduced
//! to its positive/negative/neutral bucket:
//!
//! - base case
//! - only the most recent half of the post-period
//! - only signals with `p` below the strict significance level
//!
//! A verdict is stable when every scenario lands in the base-case bucket.

use crate::effect_size::compute_effect_size;
use crate::model::{DateRange, DatedValue, MetricType};
use crate::verdict::{
    determine_verdict, partition_signals, SignalSummary, Verdict, VerdictBucket, VerdictInput,
};
use chrono::Days;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Base,
    RecentHalf,
    StrictSignificance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub verdict: Verdict,
    pub bucket: VerdictBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub scenarios: Vec<ScenarioOutcome>,
    pub is_stable: bool,
}

impl RobustnessReport {
    pub fn base_verdict(&self) -> Option<Verdict> {
        self.scenarios
            .iter()
            .find(|s| s.scenario == Scenario::Base)
            .map(|s| s.verdict)
    }
}

/// Pre-period values and dated post-period values for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWindow {
    pub metric: MetricType,
    pub before: Vec<f64>,
    pub after: Vec<DatedValue>,
}

fn outcome(scenario: Scenario, input: &VerdictInput) -> ScenarioOutcome {
    let verdict = determine_verdict(input);
    ScenarioOutcome {
        scenario,
        verdict,
        bucket: verdict.bucket(),
    }
}

/// Keep only signals with a p-value below `strict_level`
pub fn strict_scenario(base: &VerdictInput, strict_level: f64) -> VerdictInput {
    let keep = |signals: &Vec<SignalSummary>| -> Vec<SignalSummary> {
        signals
            .iter()
            .filter(|s| s.is_significant(strict_level))
            .copied()
            .collect()
    };
    VerdictInput {
        positive_signals: keep(&base.positive_signals),
        adverse_signals: keep(&base.adverse_signals),
        significance_level: strict_level,
        ..base.clone()
    }
}

/// Compare the base verdict against the recent-half and strict scenarios
pub fn assess_robustness(
    base: &VerdictInput,
    recent_half: &VerdictInput,
    strict_level: f64,
) -> RobustnessReport {
    let scenarios = vec![
        outcome(Scenario::Base, base),
        outcome(Scenario::RecentHalf, recent_half),
        outcome(Scenario::StrictSignificance, &strict_scenario(base, strict_level)),
    ];
    let base_bucket = scenarios[0].bucket;
    let is_stable = scenarios.iter().all(|s| s.bucket == base_bucket);

    if !is_stable {
        tracing::debug!(
            base = %scenarios[0].verdict,
            recent_half = %scenarios[1].verdict,
            strict = %scenarios[2].verdict,
            "verdict is not robust"
        );
    }

    RobustnessReport {
        scenarios,
        is_stable,
    }
}

/// Second half of `post`, rounding the split point toward the start
pub fn recent_half(post: DateRange) -> DateRange {
    let skip = (post.len_days() / 2) as u64;
    let start = post
        .start
        .checked_add_days(Days::new(skip))
        .unwrap_or(post.start);
    DateRange::new(start, post.end)
}

/// Build the recent-half scenario from raw metric windows and run all three
///
/// Effect sizes are recomputed with the post-period cut to its recent half;
/// days on protocol, confound load and confidence stay those of the base case.
pub fn analyze_robustness(
    base: &VerdictInput,
    windows: &[MetricWindow],
    post: DateRange,
    strict_level: f64,
) -> RobustnessReport {
    let recent = recent_half(post);
    let effects: Vec<_> = windows
        .iter()
        .map(|w| {
            let after: Vec<f64> = w
                .after
                .iter()
                .filter(|v| recent.contains(v.date))
                .map(|v| v.value)
                .collect();
            (w.metric, compute_effect_size(&w.before, &after))
        })
        .collect();
    let (positive_signals, adverse_signals) =
        partition_signals(effects.iter().map(|(m, e)| (*m, e)));

    let recent_input = VerdictInput {
        positive_signals,
        adverse_signals,
        ..base.clone()
    };
    assess_robustness(base, &recent_input, strict_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confound::ConfoundImpact;
    use crate::effect_size::Magnitude;
    use crate::model::ConfidenceTier;
    use chrono::NaiveDate;

    fn base_input(p_value: f64) -> VerdictInput {
        VerdictInput {
            days_on_protocol: 40,
            positive_signals: vec![SignalSummary {
                metric: MetricType::HrvRmssd,
                magnitude: Magnitude::Large,
                p_value: Some(p_value),
            }],
            adverse_signals: Vec::new(),
            confound_impact: ConfoundImpact::None,
            confidence: ConfidenceTier::High,
            significance_level: 0.05,
        }
    }

    #[test]
    fn test_strict_filter_drops_all_positives() {
        let base = base_input(0.03);
        assert_eq!(determine_verdict(&base), Verdict::StrongPositive);

        let report = assess_robustness(&base, &base, 0.01);
        assert_eq!(report.base_verdict(), Some(Verdict::StrongPositive));
        assert_eq!(report.scenarios[2].verdict, Verdict::NoDetectableEffect);
        assert!(!report.is_stable);
    }

    #[test]
    fn test_stable_when_all_scenarios_agree() {
        let base = base_input(0.001);
        let report = assess_robustness(&base, &base, 0.01);
        assert!(report.is_stable);
        assert!(report
            .scenarios
            .iter()
            .all(|s| s.bucket == VerdictBucket::Positive));
    }

    #[test]
    fn test_positive_grades_share_a_bucket() {
        // Strong in the base case, likely in the recent half: still stable
        let base = base_input(0.001);
        let mut recent = base.clone();
        recent.positive_signals[0].magnitude = Magnitude::Medium;
        let report = assess_robustness(&base, &recent, 0.01);
        assert_eq!(report.scenarios[1].verdict, Verdict::LikelyPositive);
        assert!(report.is_stable);
    }

    #[test]
    fn test_strict_scenario_drops_missing_p_values() {
        let mut base = base_input(0.001);
        base.positive_signals[0].p_value = None;
        let strict = strict_scenario(&base, 0.01);
        assert!(strict.positive_signals.is_empty());
        assert_eq!(strict.significance_level, 0.01);
    }

    #[test]
    fn test_recent_half() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let half = recent_half(DateRange::new(start, end));
        assert_eq!(half.start, NaiveDate::from_ymd_opt(2024, 2, 6).unwrap());
        assert_eq!(half.len_days(), 5);
    }

    #[test]
    fn test_analyze_robustness_detects_fading_effect() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let before = vec![60.0, 62.0, 58.0, 61.0, 63.0, 59.0, 64.0];
        // Early post-period is elevated, the recent half is back at baseline
        let after: Vec<DatedValue> = (0..14u64)
            .map(|offset| {
                let date = start.checked_add_days(Days::new(offset)).unwrap();
                let value = if offset < 7 { 75.0 } else { 60.0 } + (offset % 3) as f64;
                DatedValue::new(date, value)
            })
            .collect();
        let post = DateRange::new(start, start.checked_add_days(Days::new(13)).unwrap());

        let base = base_input(0.001);
        let windows = [MetricWindow {
            metric: MetricType::HrvRmssd,
            before,
            after,
        }];
        let report = analyze_robustness(&base, &windows, post, 0.01);
        assert_ne!(report.scenarios[1].bucket, VerdictBucket::Positive);
        assert!(!report.is_stable);
    }
}
