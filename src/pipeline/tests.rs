// End-to-end pipeline scenarios against the in-memory store

use super::*;
use crate::causal::AdjustmentMethod;
use crate::confound::{ConfoundImpact, ConfoundType};
use crate::effect_size::Magnitude;
use crate::model::{
    BiomarkerReading, ConfidenceTier, DailyNote, DateRange, MetricSample, MetricType, Protocol,
};
use crate::store::InMemoryRepository;
use crate::verdict::{SignalPolarity, Verdict};
use chrono::{Days, NaiveDate};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn offset(days: i64) -> NaiveDate {
    if days >= 0 {
        start().checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        start().checked_sub_days(Days::new((-days) as u64)).unwrap()
    }
}

/// 28 pre-period days and 41 post-period days with a clear shift at start
fn repository() -> InMemoryRepository {
    let mut repo = InMemoryRepository::new();
    let user = repo.user_mut("u1");
    for day in -28i64..=40 {
        let wobble = (day.rem_euclid(5)) as f64 - 2.0;
        let on = day >= 0;
        user.samples.push(MetricSample {
            date: offset(day),
            value: if on { 60.0 } else { 50.0 } + wobble,
            metric_type: MetricType::HrvRmssd,
        });
        user.samples.push(MetricSample {
            date: offset(day),
            value: if on { 55.0 } else { 62.0 } + wobble,
            metric_type: MetricType::RestingHeartRate,
        });
    }
    user.protocols.push(Protocol {
        id: "mg".to_string(),
        name: "Magnesium".to_string(),
        category: Some("supplement".to_string()),
        start_date: start(),
        end_date: None,
    });
    repo
}

#[test]
fn test_clear_improvement_is_strong_positive() {
    let repo = repository();
    let options = EvidenceOptions::new(offset(40));
    let evidence = compute_evidence(&Repositories::single(&repo), "u1", "mg", &options).unwrap();

    assert_eq!(evidence.days_on_protocol, 40);
    assert_eq!(evidence.pre_period, DateRange::new(offset(-28), offset(-1)));
    assert_eq!(evidence.post_period, DateRange::new(offset(0), offset(40)));
    assert_eq!(evidence.confounds.impact, ConfoundImpact::None);
    assert_eq!(evidence.confidence.tier, ConfidenceTier::High);
    assert_eq!(evidence.verdict, Verdict::StrongPositive);
    assert!(evidence.robustness.is_stable);

    let hrv = evidence.metric(MetricType::HrvRmssd).unwrap();
    assert_eq!(hrv.effect.magnitude, Magnitude::Large);
    assert_eq!(hrv.polarity, Some(SignalPolarity::Positive));
    assert!(hrv.baseline.is_some());
    assert!(hrv.signal.is_some());
    assert_eq!(hrv.pre_days, 28);
    assert_eq!(hrv.post_days, 41);
    assert_eq!(hrv.causal.method, AdjustmentMethod::Ols);
    assert!((hrv.causal.adjusted_effect - hrv.causal.unadjusted_effect).abs() < 1e-6);

    let rhr = evidence.metric(MetricType::RestingHeartRate).unwrap();
    assert_eq!(rhr.polarity, Some(SignalPolarity::Positive));

    assert!(evidence
        .mechanisms
        .iter()
        .any(|m| m.name == "Parasympathetic shift"));
    assert!(evidence.biomarker_correlations.is_none());
}

#[test]
fn test_evidence_is_upserted() {
    let repo = repository();
    let repos = Repositories::single(&repo);
    let first = compute_evidence(&repos, "u1", "mg", &EvidenceOptions::new(offset(20))).unwrap();
    let second = compute_evidence(&repos, "u1", "mg", &EvidenceOptions::new(offset(40))).unwrap();
    assert_ne!(first.days_on_protocol, second.days_on_protocol);

    let stored = repo.stored_evidence("u1", "mg").unwrap().unwrap();
    assert_eq!(stored, second);
}

#[test]
fn test_too_early() {
    let repo = repository();
    let evidence = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "mg",
        &EvidenceOptions::new(offset(3)),
    )
    .unwrap();
    assert_eq!(evidence.days_on_protocol, 3);
    assert_eq!(evidence.verdict, Verdict::TooEarly);
}

#[test]
fn test_as_of_before_start_clamps_to_zero_days() {
    let repo = repository();
    let evidence = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "mg",
        &EvidenceOptions::new(offset(-5)),
    )
    .unwrap();
    assert_eq!(evidence.days_on_protocol, 0);
    assert_eq!(evidence.verdict, Verdict::TooEarly);
}

#[test]
fn test_heavy_illness_is_confounded() {
    let mut repo = repository();
    let user = repo.user_mut("u1");
    for day in 0..20 {
        user.notes.push(DailyNote {
            date: offset(day),
            text: "Still sick, fever overnight".to_string(),
        });
    }

    let evidence = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "mg",
        &EvidenceOptions::new(offset(40)),
    )
    .unwrap();
    assert!(evidence.confounds.day_ratio > 0.4);
    assert_eq!(evidence.confounds.impact, ConfoundImpact::High);
    assert_eq!(evidence.verdict, Verdict::Confounded);

    let hrv = evidence.metric(MetricType::HrvRmssd).unwrap();
    assert_eq!(hrv.causal.confounders.len(), 1);
}

#[test]
fn test_seasonal_shift_alone_is_low_impact() {
    // Pre-period starts in March, protocol in April
    let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let mut repo = InMemoryRepository::new();
    let user = repo.user_mut("u1");
    for day in -28i64..=30 {
        user.samples.push(MetricSample {
            date: april + chrono::Duration::days(day),
            value: 50.0 + (day.rem_euclid(4)) as f64,
            metric_type: MetricType::HrvRmssd,
        });
    }
    user.protocols.push(Protocol {
        id: "mg".to_string(),
        name: "Magnesium".to_string(),
        category: None,
        start_date: april,
        end_date: None,
    });

    let as_of = april + chrono::Duration::days(30);
    let evidence = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "mg",
        &EvidenceOptions::new(as_of),
    )
    .unwrap();

    assert_eq!(evidence.days_on_protocol, 30);
    assert_eq!(evidence.confounds.confounders.len(), 1);
    assert_eq!(
        evidence.confounds.confounders[0].confound_type,
        ConfoundType::Seasonal
    );
    assert_eq!(evidence.confounds.day_ratio, 0.0);
    assert!((evidence.confounds.normalized_score - 25.0).abs() < 1e-9);
    assert_eq!(evidence.confounds.impact, ConfoundImpact::Low);
}

#[test]
fn test_protocol_end_date_caps_post_period() {
    let mut repo = repository();
    repo.user_mut("u1").protocols[0].end_date = Some(offset(25));
    let evidence = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "mg",
        &EvidenceOptions::new(offset(40)),
    )
    .unwrap();
    assert_eq!(evidence.days_on_protocol, 25);
    assert_eq!(evidence.post_period.end, offset(25));
}

#[test]
fn test_unknown_protocol_is_an_error() {
    let repo = repository();
    let err = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "creatine",
        &EvidenceOptions::new(offset(40)),
    )
    .unwrap_err();
    assert!(err.to_string().contains("creatine"));
}

#[test]
#[allow(clippy::field_reassign_with_default)]
fn test_invalid_config_is_an_error() {
    let repo = repository();
    let mut config = crate::config::EngineConfig::default();
    config.significance_level = 2.0;
    let options = EvidenceOptions::new(offset(40)).with_config(config);
    assert!(compute_evidence(&Repositories::single(&repo), "u1", "mg", &options).is_err());
}

#[test]
fn test_metric_selection() {
    let repo = repository();
    let options = EvidenceOptions::new(offset(40))
        .with_metrics(vec![MetricType::HrvRmssd, MetricType::Steps]);
    let evidence = compute_evidence(&Repositories::single(&repo), "u1", "mg", &options).unwrap();
    // Steps has no samples and is skipped
    assert_eq!(evidence.metrics.len(), 1);
    assert_eq!(evidence.metrics[0].metric, MetricType::HrvRmssd);
}

#[test]
fn test_biomarker_correlation() {
    let mut repo = repository();
    let user = repo.user_mut("u1");
    for (day, value) in [(-20, 1.0), (-10, 1.5), (5, 2.4), (30, 2.6)] {
        user.biomarkers.push(BiomarkerReading {
            date: offset(day),
            name: "magnesium_rbc".to_string(),
            value,
        });
    }

    let evidence = compute_evidence(
        &Repositories::single(&repo),
        "u1",
        "mg",
        &EvidenceOptions::new(offset(40)),
    )
    .unwrap();
    let correlations = evidence.biomarker_correlations.unwrap();
    let hrv = correlations
        .iter()
        .find(|c| c.metric == MetricType::HrvRmssd)
        .unwrap();
    assert_eq!(hrv.pairs, 4);
    assert!(hrv.correlation > 0.5);
}

struct FailingBiomarkers;

impl BiomarkerSource for FailingBiomarkers {
    fn biomarkers(
        &self,
        _user_id: &str,
        _range: DateRange,
    ) -> anyhow::Result<Vec<BiomarkerReading>> {
        anyhow::bail!("lab service unavailable")
    }
}

#[test]
fn test_biomarker_failure_does_not_abort() {
    let repo = repository();
    let failing = FailingBiomarkers;
    let repos = Repositories {
        biomarkers: Some(&failing),
        ..Repositories::single(&repo)
    };
    let evidence = compute_evidence(&repos, "u1", "mg", &EvidenceOptions::new(offset(40))).unwrap();
    assert!(evidence.biomarker_correlations.is_none());
    assert_eq!(evidence.verdict, Verdict::StrongPositive);
}

#[test]
fn test_evidence_serializes_without_optional_field() {
    let repo = repository();
    let repos = Repositories::single(&repo).without_biomarkers();
    let evidence = compute_evidence(&repos, "u1", "mg", &EvidenceOptions::new(offset(40))).unwrap();
    let json = serde_json::to_value(&evidence).unwrap();
    assert_eq!(json["verdict"], "strong_positive");
    assert!(json.get("biomarker_correlations").is_none());
}
