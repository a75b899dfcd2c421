// Collaborator interfaces the pipeline fetches from and persists to

use crate::confound::ConfoundEvent;
use crate::model::{BiomarkerReading, DailyNote, DateRange, DatedValue, MetricType, Protocol};
use crate::pipeline::ProtocolEvidence;
use anyhow::Result;

/// Time series store; sources are already de-duplicated upstream
pub trait MetricStore {
    /// Samples for one metric inside `range`, in date order
    fn samples(&self, user_id: &str, metric: MetricType, range: DateRange)
        -> Result<Vec<DatedValue>>;

    /// Metrics the user has any data for
    fn available_metrics(&self, user_id: &str) -> Result<Vec<MetricType>>;
}

/// Daily notes and pre-extracted confound events
pub trait AnnotationSource {
    fn notes(&self, user_id: &str, range: DateRange) -> Result<Vec<DailyNote>>;

    fn events(&self, user_id: &str, range: DateRange) -> Result<Vec<ConfoundEvent>>;
}

pub trait ProtocolRegistry {
    fn protocol(&self, user_id: &str, protocol_id: &str) -> Result<Option<Protocol>>;

    /// Every protocol the user tracks, including `protocol`'s own
    fn protocols(&self, user_id: &str) -> Result<Vec<Protocol>>;
}

/// Lab results for the optional correlation sub-analysis
pub trait BiomarkerSource {
    fn biomarkers(&self, user_id: &str, range: DateRange) -> Result<Vec<BiomarkerReading>>;
}

/// Destination of computed evidence, keyed by user and protocol
pub trait EvidenceSink {
    /// Replace any previous evidence for the same user and protocol
    fn upsert(&self, evidence: &ProtocolEvidence) -> Result<()>;
}

/// Injected collaborators for [`compute_evidence`](crate::pipeline::compute_evidence)
#[derive(Clone, Copy)]
pub struct Repositories<'a> {
    pub metrics: &'a dyn MetricStore,
    pub annotations: &'a dyn AnnotationSource,
    pub protocols: &'a dyn ProtocolRegistry,
    pub sink: &'a dyn EvidenceSink,
    pub biomarkers: Option<&'a dyn BiomarkerSource>,
}

impl<'a> Repositories<'a> {
    /// Use one backend for every role
    pub fn single<R>(repository: &'a R) -> Self
    where
        R: MetricStore + AnnotationSource + ProtocolRegistry + EvidenceSink + BiomarkerSource,
    {
        Self {
            metrics: repository,
            annotations: repository,
            protocols: repository,
            sink: repository,
            biomarkers: Some(repository),
        }
    }

    pub fn without_biomarkers(mut self) -> Self {
        self.biomarkers = None;
        self
    }
}
