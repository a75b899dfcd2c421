//! Core value types shared by every engine in the crate
//!
//! Samples, notes and protocols are owned by the upstream store and consumed
//! read-only here. Everything derived from them (baselines, effect sizes,
//! verdicts) lives next to the engine that produces it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tracked health metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    HrvRmssd,
    RestingHeartRate,
    SleepDuration,
    DeepSleep,
    RemSleep,
    SleepEfficiency,
    RecoveryScore,
    Steps,
    ActiveCalories,
    BodyWeight,
    BodyFat,
    LeanMass,
    RespiratoryRate,
    SkinTemperature,
    Spo2,
    Vo2Max,
}

/// Which way a metric has to move to count as an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredDirection {
    Higher,
    Lower,
}

impl MetricType {
    pub const ALL: [MetricType; 16] = [
        MetricType::HrvRmssd,
        MetricType::RestingHeartRate,
        MetricType::SleepDuration,
        MetricType::DeepSleep,
        MetricType::RemSleep,
        MetricType::SleepEfficiency,
        MetricType::RecoveryScore,
        MetricType::Steps,
        MetricType::ActiveCalories,
        MetricType::BodyWeight,
        MetricType::BodyFat,
        MetricType::LeanMass,
        MetricType::RespiratoryRate,
        MetricType::SkinTemperature,
        MetricType::Spo2,
        MetricType::Vo2Max,
    ];

    pub fn preferred_direction(self) -> PreferredDirection {
        match self {
            MetricType::RestingHeartRate
            | MetricType::BodyWeight
            | MetricType::BodyFat
            | MetricType::RespiratoryRate
            | MetricType::SkinTemperature => PreferredDirection::Lower,
            _ => PreferredDirection::Higher,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::HrvRmssd => "hrv_rmssd",
            MetricType::RestingHeartRate => "resting_heart_rate",
            MetricType::SleepDuration => "sleep_duration",
            MetricType::DeepSleep => "deep_sleep",
            MetricType::RemSleep => "rem_sleep",
            MetricType::SleepEfficiency => "sleep_efficiency",
            MetricType::RecoveryScore => "recovery_score",
            MetricType::Steps => "steps",
            MetricType::ActiveCalories => "active_calories",
            MetricType::BodyWeight => "body_weight",
            MetricType::BodyFat => "body_fat",
            MetricType::LeanMass => "lean_mass",
            MetricType::RespiratoryRate => "respiratory_rate",
            MetricType::SkinTemperature => "skin_temperature",
            MetricType::Spo2 => "spo2",
            MetricType::Vo2Max => "vo2_max",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricType::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown metric type: {s}"))
    }
}

/// Three-level confidence shared by the causal, mechanism and verdict engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// One immutable point of a metric time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub date: NaiveDate,
    pub value: f64,
    pub metric_type: MetricType,
}

/// A `(date, value)` pair once the metric type is implied by context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

impl DatedValue {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

impl From<&MetricSample> for DatedValue {
    fn from(sample: &MetricSample) -> Self {
        Self {
            date: sample.date,
            value: sample.value,
        }
    }
}

/// Inclusive calendar range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, 0 for an inverted range
    pub fn len_days(&self) -> usize {
        let days = (self.end - self.start).num_days() + 1;
        days.max(0) as usize
    }

    /// Overlap of two ranges, `None` when they are disjoint
    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let range = DateRange::new(self.start.max(other.start), self.end.min(other.end));
        (range.start <= range.end).then_some(range)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days() as u64).filter_map(move |offset| {
            start.checked_add_days(chrono::Days::new(offset))
        })
    }
}

/// A tracked intervention with a start date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Free-text daily annotation written by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNote {
    pub date: NaiveDate,
    pub text: String,
}

/// Lab biomarker reading used by the optional correlation sub-analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerReading {
    pub date: NaiveDate,
    pub name: String,
    pub value: f64,
}

/// Average samples that share a date, returning one value per day in date order
pub fn aggregate_daily(values: &[DatedValue]) -> Vec<DatedValue> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for point in values {
        if !point.value.is_finite() {
            continue;
        }
        let bucket = buckets.entry(point.date).or_insert((0.0, 0));
        bucket.0 += point.value;
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| DatedValue::new(date, sum / count as f64))
        .collect()
}
