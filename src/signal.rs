//! Baseline-relative signal classification
//!
//! Separates day-to-day noise from real change. A reading is compared to the
//! personal baseline as a z-score; the noise threshold widens for volatile
//! metrics (coefficient of variation above 25%), and the last week decides
//! between a blip, a short-term change and a sustained trend.

use crate::baseline::MetricBaseline;
use crate::math::normal_cdf;
use crate::model::DatedValue;
use crate::stats::{coefficient_of_variation, safe_divide};
use serde::{Deserialize, Serialize};

/// Coefficient of variation (percent) above which a metric counts as volatile
pub const VOLATILE_CV_PERCENT: f64 = 25.0;
/// Noise threshold in standard deviations for volatile metrics
pub const VOLATILE_NOISE_THRESHOLD: f64 = 0.8;
/// Noise threshold in standard deviations for stable metrics
pub const STABLE_NOISE_THRESHOLD: f64 = 0.5;
/// Number of most recent days scanned for same-direction deviations
pub const LOOKBACK_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationDirection {
    Above,
    Below,
    At,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    None,
    Low,
    Medium,
    High,
}

impl Significance {
    fn from_z(z: f64) -> Self {
        let z = z.abs();
        if z >= 2.0 {
            Significance::High
        } else if z >= 1.0 {
            Significance::Medium
        } else if z >= 0.5 {
            Significance::Low
        } else {
            Significance::None
        }
    }
}

/// One reading compared against a baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub value: f64,
    pub absolute_delta: f64,
    pub percent_delta: f64,
    pub z_score: f64,
    pub direction: DeviationDirection,
    pub significance: Significance,
    /// Position of the reading in the baseline distribution (0-100)
    pub percentile: f64,
}

/// Compare a single reading against a baseline
pub fn compare_to_baseline(value: f64, baseline: &MetricBaseline) -> BaselineComparison {
    let absolute_delta = value - baseline.mean;
    let percent_delta = safe_divide(absolute_delta, baseline.mean.abs()) * 100.0;
    let z_score = safe_divide(absolute_delta, baseline.std_dev);

    let direction = if z_score.abs() < 0.1 {
        DeviationDirection::At
    } else if z_score > 0.0 {
        DeviationDirection::Above
    } else {
        DeviationDirection::Below
    };

    BaselineComparison {
        value,
        absolute_delta,
        percent_delta,
        z_score,
        direction,
        significance: Significance::from_z(z_score),
        percentile: normal_cdf(z_score) * 100.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalClass {
    Noise,
    Blip,
    ShortTermChange,
    SustainedTrend,
}

/// Classification of the most recent reading in context of the last week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalClassification {
    pub class: SignalClass,
    /// Classification confidence (0-100)
    pub confidence: u8,
    pub latest: BaselineComparison,
    /// Noise threshold applied, in standard deviations
    pub threshold: f64,
    /// Unbroken streak of same-direction deviations ending at the latest day
    pub consecutive_days: usize,
    /// Same-direction deviations anywhere in the look-back window
    pub same_direction_days: usize,
}

/// Classify the latest reading of `recent` against `baseline`
///
/// Returns `None` when `recent` is empty.
pub fn classify_signal(
    recent: &[DatedValue],
    baseline: &MetricBaseline,
) -> Option<SignalClassification> {
    classify_signal_with_lookback(recent, baseline, LOOKBACK_DAYS)
}

/// [`classify_signal`] scanning the `lookback` most recent days
pub fn classify_signal_with_lookback(
    recent: &[DatedValue],
    baseline: &MetricBaseline,
    lookback: usize,
) -> Option<SignalClassification> {
    let mut by_date: Vec<&DatedValue> = recent.iter().filter(|v| v.value.is_finite()).collect();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));
    let latest = compare_to_baseline(by_date.first()?.value, baseline);

    let cv = coefficient_of_variation(baseline.std_dev, baseline.mean);
    let threshold = if cv > VOLATILE_CV_PERCENT {
        VOLATILE_NOISE_THRESHOLD
    } else {
        STABLE_NOISE_THRESHOLD
    };

    if latest.z_score.abs() < threshold {
        return Some(SignalClassification {
            class: SignalClass::Noise,
            confidence: 90,
            latest,
            threshold,
            consecutive_days: 0,
            same_direction_days: 0,
        });
    }

    let positive = latest.z_score > 0.0;
    let matches = |z: f64| z.abs() >= threshold && (z > 0.0) == positive;

    let mut same_direction_days = 0;
    let mut consecutive_days = 0;
    let mut streak_open = true;
    for point in by_date.iter().take(lookback) {
        let z = compare_to_baseline(point.value, baseline).z_score;
        if matches(z) {
            same_direction_days += 1;
            if streak_open {
                consecutive_days += 1;
            }
        } else {
            streak_open = false;
        }
    }

    let (class, confidence) = if same_direction_days >= 5 {
        (
            SignalClass::SustainedTrend,
            (70 + 3 * same_direction_days).min(95),
        )
    } else if consecutive_days >= 2 {
        (
            SignalClass::ShortTermChange,
            (50 + 10 * consecutive_days).min(80),
        )
    } else {
        (SignalClass::Blip, 40)
    };

    Some(SignalClassification {
        class,
        confidence: confidence as u8,
        latest,
        threshold,
        consecutive_days,
        same_direction_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricType;
    use chrono::NaiveDate;

    fn baseline(mean: f64, std_dev: f64) -> MetricBaseline {
        MetricBaseline {
            metric_type: MetricType::HrvRmssd,
            mean,
            std_dev,
            median: mean,
            p25: mean - std_dev,
            p75: mean + std_dev,
            min: mean - 3.0 * std_dev,
            max: mean + 3.0 * std_dev,
            data_points: 20,
            window_days: 28,
            last_updated: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    /// Newest value first; dates count backwards from June 30th
    fn recent(values_newest_first: &[f64]) -> Vec<DatedValue> {
        values_newest_first
            .iter()
            .enumerate()
            .map(|(i, v)| DatedValue::new(NaiveDate::from_ymd_opt(2024, 6, 30 - i as u32).unwrap(), *v))
            .collect()
    }

    #[test]
    fn test_compare_at_mean() {
        let cmp = compare_to_baseline(50.0, &baseline(50.0, 5.0));
        assert_eq!(cmp.z_score, 0.0);
        assert_eq!(cmp.direction, DeviationDirection::At);
        assert_eq!(cmp.significance, Significance::None);
        assert!((cmp.percentile - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_compare_significance_tiers() {
        let b = baseline(50.0, 5.0);
        assert_eq!(compare_to_baseline(60.0, &b).significance, Significance::High);
        assert_eq!(compare_to_baseline(45.0, &b).significance, Significance::Medium);
        assert_eq!(compare_to_baseline(52.5, &b).significance, Significance::Low);
        assert_eq!(compare_to_baseline(51.0, &b).significance, Significance::None);
        assert_eq!(compare_to_baseline(45.0, &b).direction, DeviationDirection::Below);
        assert_eq!(compare_to_baseline(52.5, &b).direction, DeviationDirection::Above);
    }

    #[test]
    fn test_compare_zero_std_and_zero_mean() {
        let cmp = compare_to_baseline(10.0, &baseline(0.0, 0.0));
        assert_eq!(cmp.z_score, 0.0);
        assert_eq!(cmp.percent_delta, 0.0);
        assert_eq!(cmp.absolute_delta, 10.0);
        assert!(cmp.percentile.is_finite());
    }

    #[test]
    fn test_classify_noise_below_threshold() {
        // CV 10% -> threshold 0.5 sd; latest z = 0.4
        let class = classify_signal(&recent(&[52.0, 60.0, 60.0]), &baseline(50.0, 5.0)).unwrap();
        assert_eq!(class.class, SignalClass::Noise);
        assert_eq!(class.confidence, 90);
        assert_eq!(class.threshold, STABLE_NOISE_THRESHOLD);
    }

    #[test]
    fn test_volatile_metric_widens_threshold() {
        // CV 30% -> threshold 0.8 sd; latest z = 0.73 is still noise
        let class = classify_signal(&recent(&[61.0]), &baseline(50.0, 15.0)).unwrap();
        assert_eq!(class.threshold, VOLATILE_NOISE_THRESHOLD);
        assert_eq!(class.class, SignalClass::Noise);
    }

    #[test]
    fn test_classify_blip() {
        let class = classify_signal(&recent(&[60.0, 50.0, 49.0]), &baseline(50.0, 5.0)).unwrap();
        assert_eq!(class.class, SignalClass::Blip);
        assert_eq!(class.confidence, 40);
        assert_eq!(class.consecutive_days, 1);
    }

    #[test]
    fn test_classify_short_term_change() {
        let class =
            classify_signal(&recent(&[60.0, 58.0, 57.0, 50.0, 49.0]), &baseline(50.0, 5.0)).unwrap();
        assert_eq!(class.class, SignalClass::ShortTermChange);
        assert_eq!(class.consecutive_days, 3);
        assert_eq!(class.confidence, 80);
    }

    #[test]
    fn test_classify_sustained_trend_allows_gaps() {
        // Five of seven days above threshold, streak broken on day 2
        let values = [58.0, 57.0, 50.0, 59.0, 56.0, 49.0, 58.0, 70.0];
        let class = classify_signal(&recent(&values), &baseline(50.0, 5.0)).unwrap();
        assert_eq!(class.class, SignalClass::SustainedTrend);
        assert_eq!(class.same_direction_days, 5);
        assert_eq!(class.consecutive_days, 2);
        assert_eq!(class.confidence, 85);
    }

    #[test]
    fn test_opposite_direction_days_do_not_count() {
        let values = [58.0, 42.0, 41.0, 40.0, 43.0, 42.0, 41.0];
        let class = classify_signal(&recent(&values), &baseline(50.0, 5.0)).unwrap();
        assert_eq!(class.same_direction_days, 1);
        assert_eq!(class.class, SignalClass::Blip);
    }

    #[test]
    fn test_classify_uses_most_recent_date_regardless_of_order() {
        let mut values = recent(&[60.0, 50.0]);
        values.reverse();
        let class = classify_signal(&values, &baseline(50.0, 5.0)).unwrap();
        assert_eq!(class.latest.value, 60.0);
    }

    #[test]
    fn test_classify_empty_is_none() {
        assert!(classify_signal(&[], &baseline(50.0, 5.0)).is_none());
    }
}
