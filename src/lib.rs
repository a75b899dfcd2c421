//! Veredicto - causally-aware verdicts on personal health protocols
//!
//! This library turns longitudinal health-metric series (sleep, recovery,
//! activity, body composition) into an evidence-backed verdict on whether a
//! tracked protocol is having a measurable effect. It provides personal
//! baselines, signal classification, effect-size statistics, confound
//! detection with OLS adjustment, and a stateless verdict engine, plus an
//! append-only evidence ledger.
//!
//! Every engine is a pure function over in-memory data. The [`pipeline`]
//! module wires them together behind injected repository traits.

pub mod baseline;
pub mod causal;
pub mod cli;
pub mod config;
pub mod confound;
pub mod effect_size;
pub mod ledger;
pub mod linalg;
pub mod math;
pub mod mechanism;
pub mod model;
pub mod pipeline;
pub mod robustness;
pub mod signal;
pub mod stats;
pub mod store;
pub mod verdict;
