//! Personal baseline computation
//!
//! A baseline is a rolling reference distribution for one metric over a
//! trailing window. It is always regenerable from raw samples and is never
//! stored as the source of truth.
//!
//! Outliers are fenced at 3 x IQR, wider than the effect-size engine's
//! 1.5 x IQR, so legitimate physiological spikes stay in the reference.
//! The output standard deviation is the *population* deviation (n
//! denominator), unlike the sample deviation used for Cohen's d.

use crate::model::{DatedValue, MetricType};
use crate::stats::{mean, percentile, population_std_dev, sorted_finite, split_outliers};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// IQR fence for baseline windows
pub const BASELINE_IQR_MULTIPLIER: f64 = 3.0;

/// Window and minimum-size settings for [`compute_baseline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineOptions {
    /// Trailing window length in days
    pub window_days: u32,
    /// Minimum number of samples, both before and after outlier removal
    pub min_data_points: usize,
}

impl Default for BaselineOptions {
    fn default() -> Self {
        Self {
            window_days: 28,
            min_data_points: 5,
        }
    }
}

/// Snapshot of a metric's personal reference distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBaseline {
    pub metric_type: MetricType,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub min: f64,
    pub max: f64,
    pub data_points: usize,
    pub window_days: u32,
    /// Reference end date of the window
    pub last_updated: NaiveDate,
}

/// Compute the baseline over `[end - window_days, end]`
///
/// Returns `None` when fewer than `min_data_points` samples fall in the
/// window, or remain after 3 x IQR outlier removal.
pub fn compute_baseline(
    metric_type: MetricType,
    samples: &[DatedValue],
    end: NaiveDate,
    options: &BaselineOptions,
) -> Option<MetricBaseline> {
    let start = end
        .checked_sub_days(Days::new(u64::from(options.window_days)))
        .unwrap_or(NaiveDate::MIN);

    let windowed: Vec<f64> = samples
        .iter()
        .filter(|s| s.date >= start && s.date <= end && s.value.is_finite())
        .map(|s| s.value)
        .collect();

    if windowed.len() < options.min_data_points {
        tracing::debug!(
            metric = %metric_type,
            samples = windowed.len(),
            required = options.min_data_points,
            "baseline window too sparse"
        );
        return None;
    }

    let cleaned = split_outliers(&windowed, BASELINE_IQR_MULTIPLIER);
    if cleaned.kept.len() < options.min_data_points {
        tracing::debug!(
            metric = %metric_type,
            kept = cleaned.kept.len(),
            removed = cleaned.removed_count(),
            "baseline too sparse after outlier removal"
        );
        return None;
    }

    let sorted = sorted_finite(&cleaned.kept);
    Some(MetricBaseline {
        metric_type,
        mean: mean(&sorted),
        std_dev: population_std_dev(&sorted),
        median: percentile(&sorted, 50.0),
        p25: percentile(&sorted, 25.0),
        p75: percentile(&sorted, 75.0),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        data_points: sorted.len(),
        window_days: options.window_days,
        last_updated: end,
    })
}
