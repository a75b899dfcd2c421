// Evidence Pipeline
//
// Orchestrates every engine for one (user, protocol) pair:
//
// 1. Resolve the protocol and derive the pre- and post-periods
// 2. Detect confounds over the observation window
// 3. Per metric: baseline, effect size, signal class, causal adjustment
// 4. Confidence score, verdict, mechanisms and robustness
// 5. Optional biomarker correlation, omitted on failure
// 6. Upsert through the evidence sink
//
// All I/O goes through the injected repository traits. The engines
// themselves stay pure, so the whole computation is testable against the
// in-memory store.

mod compute;
mod evidence;
mod repository;

pub use compute::{compute_evidence, EvidenceOptions};
pub use evidence::{BiomarkerCorrelation, MetricEvidence, ProtocolEvidence};
pub use repository::{
    AnnotationSource, BiomarkerSource, EvidenceSink, MetricStore, ProtocolRegistry, Repositories,
};

#[cfg(test)]
mod tests;
