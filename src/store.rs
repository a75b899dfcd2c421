//! In-memory repository backing every pipeline collaborator
//!
//! Deserializes from the JSON document the binary reads:
//!
//! ```json
//! {
//!   "users": {
//!     "u1": {
//!       "samples": [{"date": "2024-05-01", "value": 52.0, "metric_type": "hrv_rmssd"}],
//!       "notes": [{"date": "2024-05-03", "text": "flight to Lisbon"}],
//!       "protocols": [{"id": "mg", "name": "Magnesium", "start_date": "2024-05-10"}]
//!     }
//!   }
//! }
//! ```
//!
//! Persisted evidence is kept behind a mutex and never serialized back.

use crate::confound::ConfoundEvent;
use crate::model::{
    BiomarkerReading, DailyNote, DateRange, DatedValue, MetricSample, MetricType, Protocol,
};
use crate::pipeline::{
    AnnotationSource, BiomarkerSource, EvidenceSink, MetricStore, ProtocolEvidence,
    ProtocolRegistry,
};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Everything recorded for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecords {
    pub samples: Vec<MetricSample>,
    pub notes: Vec<DailyNote>,
    pub events: Vec<ConfoundEvent>,
    pub protocols: Vec<Protocol>,
    pub biomarkers: Vec<BiomarkerReading>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryRepository {
    pub users: BTreeMap<String, UserRecords>,
    #[serde(skip)]
    evidence: Mutex<BTreeMap<(String, String), ProtocolEvidence>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Records for `user_id`, created on first access
    pub fn user_mut(&mut self, user_id: &str) -> &mut UserRecords {
        self.users.entry(user_id.to_string()).or_default()
    }

    /// Last evidence upserted for a user and protocol
    pub fn stored_evidence(&self, user_id: &str, protocol_id: &str) -> Result<Option<ProtocolEvidence>> {
        let stored = self
            .evidence
            .lock()
            .map_err(|_| anyhow!("evidence store lock poisoned"))?;
        Ok(stored
            .get(&(user_id.to_string(), protocol_id.to_string()))
            .cloned())
    }

    fn user(&self, user_id: &str) -> Option<&UserRecords> {
        self.users.get(user_id)
    }
}

impl MetricStore for InMemoryRepository {
    fn samples(
        &self,
        user_id: &str,
        metric: MetricType,
        range: DateRange,
    ) -> Result<Vec<DatedValue>> {
        let mut values: Vec<DatedValue> = self
            .user(user_id)
            .map(|u| {
                u.samples
                    .iter()
                    .filter(|s| s.metric_type == metric && range.contains(s.date))
                    .map(DatedValue::from)
                    .collect()
            })
            .unwrap_or_default();
        values.sort_by_key(|v| v.date);
        Ok(values)
    }

    fn available_metrics(&self, user_id: &str) -> Result<Vec<MetricType>> {
        let metrics: BTreeSet<MetricType> = self
            .user(user_id)
            .map(|u| u.samples.iter().map(|s| s.metric_type).collect())
            .unwrap_or_default();
        Ok(metrics.into_iter().collect())
    }
}

impl AnnotationSource for InMemoryRepository {
    fn notes(&self, user_id: &str, range: DateRange) -> Result<Vec<DailyNote>> {
        Ok(self
            .user(user_id)
            .map(|u| {
                u.notes
                    .iter()
                    .filter(|n| range.contains(n.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn events(&self, user_id: &str, range: DateRange) -> Result<Vec<ConfoundEvent>> {
        Ok(self
            .user(user_id)
            .map(|u| {
                u.events
                    .iter()
                    .filter(|e| range.contains(e.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl ProtocolRegistry for InMemoryRepository {
    fn protocol(&self, user_id: &str, protocol_id: &str) -> Result<Option<Protocol>> {
        Ok(self
            .user(user_id)
            .and_then(|u| u.protocols.iter().find(|p| p.id == protocol_id))
            .cloned())
    }

    fn protocols(&self, user_id: &str) -> Result<Vec<Protocol>> {
        Ok(self
            .user(user_id)
            .map(|u| u.protocols.clone())
            .unwrap_or_default())
    }
}

impl BiomarkerSource for InMemoryRepository {
    fn biomarkers(&self, user_id: &str, range: DateRange) -> Result<Vec<BiomarkerReading>> {
        Ok(self
            .user(user_id)
            .map(|u| {
                u.biomarkers
                    .iter()
                    .filter(|b| range.contains(b.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl EvidenceSink for InMemoryRepository {
    fn upsert(&self, evidence: &ProtocolEvidence) -> Result<()> {
        let mut stored = self
            .evidence
            .lock()
            .map_err(|_| anyhow!("evidence store lock poisoned"))?;
        stored.insert(
            (evidence.user_id.clone(), evidence.protocol_id.clone()),
            evidence.clone(),
        );
        Ok(())
    }
}
