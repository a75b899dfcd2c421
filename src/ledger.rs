//! Evidence ledger
//!
//! Append-only log of claims about a protocol: observations, attributions
//! and predictions. Entries are never edited except for one transition on
//! predictions, `pending -> confirmed | refuted`, which can happen once.
//!
//! Persisted as JSON lines. Loading is best-effort: a malformed line is
//! logged and skipped without discarding the rest of the file.

use crate::effect_size::EffectDirection;
use crate::model::{ConfidenceTier, MetricType};
use crate::pipeline::ProtocolEvidence;
use crate::verdict::{SignalPolarity, Verdict};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Days after recording when a prediction becomes due
pub const PREDICTION_HORIZON_DAYS: u64 = 14;

const ID_HEX_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger entry not found: {0}")]
    UnknownEntry(String),

    #[error("Ledger entry {0} carries no prediction")]
    NoPrediction(String),

    #[error("Invalid prediction transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Observation,
    Attribution,
    Prediction,
}

impl ClaimType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::Observation => "observation",
            ClaimType::Attribution => "attribution",
            ClaimType::Prediction => "prediction",
        }
    }
}

/// Lifecycle of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Pending,
    Confirmed { resolved_on: NaiveDate },
    Refuted { resolved_on: NaiveDate },
}

impl PredictionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionOutcome::Pending => "pending",
            PredictionOutcome::Confirmed { .. } => "confirmed",
            PredictionOutcome::Refuted { .. } => "refuted",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PredictionOutcome::Pending)
    }
}

/// Terminal state a pending prediction can move to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    Refuted,
}

impl Resolution {
    fn as_str(self) -> &'static str {
        match self {
            Resolution::Confirmed => "confirmed",
            Resolution::Refuted => "refuted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub metric: MetricType,
    pub expected_direction: EffectDirection,
    pub due: NaiveDate,
    pub outcome: PredictionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub protocol_id: String,
    pub recorded_on: NaiveDate,
    pub claim_type: ClaimType,
    pub claim: String,
    pub evidence: Vec<String>,
    pub confidence: ConfidenceTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
}

impl LedgerEntry {
    pub fn new(
        user_id: impl Into<String>,
        protocol_id: impl Into<String>,
        recorded_on: NaiveDate,
        claim_type: ClaimType,
        claim: impl Into<String>,
        confidence: ConfidenceTier,
    ) -> Self {
        let user_id = user_id.into();
        let protocol_id = protocol_id.into();
        let claim = claim.into();
        Self {
            id: entry_id(&user_id, &protocol_id, claim_type, &claim, recorded_on),
            user_id,
            protocol_id,
            recorded_on,
            claim_type,
            claim,
            evidence: Vec::new(),
            confidence,
            prediction: None,
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    pub fn with_prediction(mut self, metric: MetricType, expected: EffectDirection, due: NaiveDate) -> Self {
        self.prediction = Some(Prediction {
            metric,
            expected_direction: expected,
            due,
            outcome: PredictionOutcome::Pending,
        });
        self
    }
}

/// First 16 hex characters of SHA-256 over owner, claim type, claim and date
pub fn entry_id(
    user_id: &str,
    protocol_id: &str,
    claim_type: ClaimType,
    claim: &str,
    recorded_on: NaiveDate,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(protocol_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(claim_type.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(claim.as_bytes());
    hasher.update(b"\n");
    hasher.update(recorded_on.to_string().as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_HEX_LEN);
    id
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceLedger {
    entries: Vec<LedgerEntry>,
}

impl EvidenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Append `entry` unless an entry with the same id exists
    ///
    /// Returns whether the entry was added, so re-running the same day is
    /// idempotent.
    pub fn append(&mut self, entry: LedgerEntry) -> bool {
        if self.get(&entry.id).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn pending_predictions(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| {
            e.prediction
                .as_ref()
                .is_some_and(|p| p.outcome.is_pending())
        })
    }

    /// Move a pending prediction to its terminal state
    pub fn resolve_prediction(&mut self, id: &str, resolution: Resolution, on: NaiveDate) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| LedgerError::UnknownEntry(id.to_string()))?;
        let prediction = entry
            .prediction
            .as_mut()
            .ok_or_else(|| LedgerError::NoPrediction(id.to_string()))?;

        if !prediction.outcome.is_pending() {
            return Err(LedgerError::InvalidTransition {
                id: id.to_string(),
                from: prediction.outcome.as_str(),
                to: resolution.as_str(),
            });
        }

        prediction.outcome = match resolution {
            Resolution::Confirmed => PredictionOutcome::Confirmed { resolved_on: on },
            Resolution::Refuted => PredictionOutcome::Refuted { resolved_on: on },
        };
        Ok(())
    }

    /// Resolve every pending prediction due on or before `as_of`
    ///
    /// A prediction is confirmed when the observed direction for its metric
    /// matches the expected one and refuted otherwise. Predictions without an
    /// observation stay pending. Returns the ids that were resolved.
    pub fn resolve_due_predictions(
        &mut self,
        as_of: NaiveDate,
        observed: &HashMap<MetricType, EffectDirection>,
    ) -> Vec<String> {
        self.resolve_due_where(as_of, observed, |_| true)
    }

    /// [`resolve_due_predictions`](Self::resolve_due_predictions) limited to
    /// one user and protocol
    pub fn resolve_due_predictions_for(
        &mut self,
        user_id: &str,
        protocol_id: &str,
        as_of: NaiveDate,
        observed: &HashMap<MetricType, EffectDirection>,
    ) -> Vec<String> {
        self.resolve_due_where(as_of, observed, |e| {
            e.user_id == user_id && e.protocol_id == protocol_id
        })
    }

    fn resolve_due_where<F>(
        &mut self,
        as_of: NaiveDate,
        observed: &HashMap<MetricType, EffectDirection>,
        scope: F,
    ) -> Vec<String>
    where
        F: Fn(&LedgerEntry) -> bool,
    {
        let due: Vec<(String, Resolution)> = self
            .pending_predictions()
            .filter(|entry| scope(entry))
            .filter_map(|entry| {
                let prediction = entry.prediction.as_ref()?;
                if prediction.due > as_of {
                    return None;
                }
                let actual = observed.get(&prediction.metric)?;
                let resolution = if *actual == prediction.expected_direction {
                    Resolution::Confirmed
                } else {
                    Resolution::Refuted
                };
                Some((entry.id.clone(), resolution))
            })
            .collect();

        let mut resolved = Vec::with_capacity(due.len());
        for (id, resolution) in due {
            match self.resolve_prediction(&id, resolution, as_of) {
                Ok(()) => resolved.push(id),
                Err(e) => tracing::warn!(error = %e, "failed to resolve prediction"),
            }
        }
        resolved
    }

    /// Record claims derived from freshly computed evidence
    ///
    /// Adds one attribution for the verdict, one observation per
    /// non-negligible metric effect and, for likely or strong positive
    /// verdicts, a prediction per positive metric that the effect holds.
    /// Returns the ids of the entries actually appended.
    pub fn record_evidence(&mut self, evidence: &ProtocolEvidence) -> Vec<String> {
        let on = evidence.as_of;
        let confidence = evidence.confidence.tier;
        let predicts = matches!(
            evidence.verdict,
            Verdict::LikelyPositive | Verdict::StrongPositive
        );
        let mut candidates = Vec::new();

        candidates.push(
            LedgerEntry::new(
                &evidence.user_id,
                &evidence.protocol_id,
                on,
                ClaimType::Attribution,
                format!(
                    "{} ({}): verdict {}",
                    evidence.protocol_name, evidence.protocol_id, evidence.verdict
                ),
                confidence,
            )
            .with_evidence(format!("days on protocol: {}", evidence.days_on_protocol))
            .with_evidence(format!("confidence score: {}", evidence.confidence.score))
            .with_evidence(format!("confound impact: {:?}", evidence.confounds.impact))
            .with_evidence(format!("robust: {}", evidence.robustness.is_stable)),
        );

        for metric in &evidence.metrics {
            let Some(polarity) = metric.polarity else {
                continue;
            };
            let effect = &metric.effect;
            let mut entry = LedgerEntry::new(
                &evidence.user_id,
                &evidence.protocol_id,
                on,
                ClaimType::Observation,
                format!(
                    "{}: {} moved {:+.1}% on {}",
                    evidence.protocol_id, metric.metric, effect.percent_change, evidence.protocol_name
                ),
                confidence,
            )
            .with_evidence(format!("cohens_d: {:.3}", effect.cohens_d))
            .with_evidence(format!("adjusted effect: {:.3}", metric.causal.adjusted_effect));
            if let Some(p) = effect.p_value {
                entry = entry.with_evidence(format!("p_value: {p:.4}"));
            }
            candidates.push(entry);

            if predicts && polarity == SignalPolarity::Positive {
                let Some(due) = on.checked_add_days(Days::new(PREDICTION_HORIZON_DAYS)) else {
                    continue;
                };
                candidates.push(
                    LedgerEntry::new(
                        &evidence.user_id,
                        &evidence.protocol_id,
                        on,
                        ClaimType::Prediction,
                        format!(
                            "{}: {} keeps its {:?} direction through {}",
                            evidence.protocol_id, metric.metric, effect.direction, due
                        ),
                        confidence,
                    )
                    .with_prediction(metric.metric, effect.direction, due),
                );
            }
        }

        candidates
            .into_iter()
            .filter_map(|entry| {
                let id = entry.id.clone();
                self.append(entry).then_some(id)
            })
            .collect()
    }

    /// Write every entry as one JSON object per line
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load a JSON-lines ledger, skipping malformed lines
    ///
    /// Returns the ledger and the number of skipped lines. A missing file is
    /// an empty ledger.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, usize)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::new(), 0));
        }

        let reader = BufReader::new(File::open(path)?);
        let mut ledger = Self::new();
        let mut skipped = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LedgerEntry>(&line) {
                Ok(entry) => {
                    ledger.append(entry);
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(line = index + 1, error = %e, "skipping malformed ledger entry");
                }
            }
        }
        Ok((ledger, skipped))
    }
}
