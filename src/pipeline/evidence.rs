// Aggregate evidence for one (user, protocol) pair

use crate::baseline::MetricBaseline;
use crate::causal::CausalInferenceResult;
use crate::confound::ConfoundAssessment;
use crate::effect_size::EffectSizeResult;
use crate::mechanism::DetectedMechanism;
use crate::model::{DateRange, MetricType};
use crate::robustness::RobustnessReport;
use crate::signal::SignalClassification;
use crate::verdict::{ConfidenceScore, SignalPolarity, Verdict};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything derived for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvidence {
    pub metric: MetricType,
    /// Pre-protocol baseline; absent when the pre-period is too sparse
    pub baseline: Option<MetricBaseline>,
    pub effect: EffectSizeResult,
    /// Latest post-period reading against the baseline
    pub signal: Option<SignalClassification>,
    pub causal: CausalInferenceResult,
    /// Positive or adverse relative to the metric's preferred direction
    pub polarity: Option<SignalPolarity>,
    pub pre_days: usize,
    pub post_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerCorrelation {
    pub biomarker: String,
    pub metric: MetricType,
    /// Pearson r over dates present in both series
    pub correlation: f64,
    pub pairs: usize,
}

/// Fresh derivation for one user and protocol, recomputed on every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEvidence {
    pub user_id: String,
    pub protocol_id: String,
    pub protocol_name: String,
    pub as_of: NaiveDate,
    pub days_on_protocol: i64,
    pub pre_period: DateRange,
    pub post_period: DateRange,
    pub verdict: Verdict,
    pub confidence: ConfidenceScore,
    pub metrics: Vec<MetricEvidence>,
    pub confounds: ConfoundAssessment,
    pub mechanisms: Vec<DetectedMechanism>,
    pub robustness: RobustnessReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomarker_correlations: Option<Vec<BiomarkerCorrelation>>,
}

impl ProtocolEvidence {
    pub fn metric(&self, metric: MetricType) -> Option<&MetricEvidence> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}
