//! Evidence engine benchmarks
//!
//! Measures the three hot paths of an evaluation run:
//!
//! 1. `compute_effect_size` - IQR cleaning, Cohen's d and Welch's t-test
//! 2. `adjust_for_confounders` - OLS through the Cholesky normal equations
//! 3. `compute_evidence` - the whole pipeline against the in-memory store
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench evidence_engine
//! ```

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use veredicto::causal::adjust_for_confounders;
use veredicto::confound::{ConfoundType, Confounder};
use veredicto::effect_size::compute_effect_size;
use veredicto::model::{DailyNote, DatedValue, MetricSample, MetricType, Protocol};
use veredicto::pipeline::{compute_evidence, EvidenceOptions, Repositories};
use veredicto::store::InMemoryRepository;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn day(offset: u64) -> NaiveDate {
    start().checked_add_days(Days::new(offset)).unwrap()
}

/// Deterministic pseudo-noise in [-1, 1)
fn noise(i: u64) -> f64 {
    let x = i.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1) >> 33;
    (x % 2000) as f64 / 1000.0 - 1.0
}

fn sample(n: usize, mean: f64, seed: u64) -> Vec<f64> {
    (0..n as u64).map(|i| mean + 5.0 * noise(seed + i)).collect()
}

fn bench_effect_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("effect_size");

    for n in [7usize, 30, 90, 365] {
        let before = sample(n, 50.0, 0);
        let after = sample(n, 55.0, 10_000);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| compute_effect_size(black_box(&before), black_box(&after)));
        });
    }

    group.finish();
}

fn bench_causal_adjustment(c: &mut Criterion) {
    let mut group = c.benchmark_group("causal_adjustment");

    for confound_count in [0usize, 2, 4] {
        let values: Vec<DatedValue> = (0..120u64)
            .map(|i| {
                let shift = if i >= 60 { 5.0 } else { 0.0 };
                DatedValue::new(day(i), 50.0 + shift + noise(i))
            })
            .collect();
        let confounders: Vec<Confounder> = (0..confound_count)
            .map(|k| {
                let days = (0..120u64)
                    .filter(|i| i % (k as u64 + 3) == 0)
                    .map(day)
                    .collect();
                Confounder::new(format!("confound {k}"), ConfoundType::Stress, days)
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(confound_count),
            &confound_count,
            |b, _| {
                b.iter(|| {
                    adjust_for_confounders(black_box(&values), day(60), black_box(&confounders))
                });
            },
        );
    }

    group.finish();
}

fn bench_compute_evidence(c: &mut Criterion) {
    let mut repo = InMemoryRepository::new();
    let user = repo.user_mut("bench");
    for i in 0..120u64 {
        let shift = if i >= 60 { 4.0 } else { 0.0 };
        for (metric, base) in [
            (MetricType::HrvRmssd, 50.0),
            (MetricType::RestingHeartRate, 60.0),
            (MetricType::SleepDuration, 420.0),
            (MetricType::DeepSleep, 80.0),
        ] {
            user.samples.push(MetricSample {
                date: day(i),
                value: base + shift + 3.0 * noise(i),
                metric_type: metric,
            });
        }
        if i % 11 == 0 {
            user.notes.push(DailyNote {
                date: day(i),
                text: "stressful deadline at work".to_string(),
            });
        }
    }
    user.protocols.push(Protocol {
        id: "sauna".to_string(),
        name: "Evening sauna".to_string(),
        category: None,
        start_date: day(60),
        end_date: None,
    });

    let repos = Repositories::single(&repo);
    let options = EvidenceOptions::new(day(119));

    c.bench_function("compute_evidence_4_metrics_60_days", |b| {
        b.iter(|| compute_evidence(black_box(&repos), "bench", "sauna", black_box(&options)));
    });
}

criterion_group!(
    benches,
    bench_effect_size,
    bench_causal_adjustment,
    bench_compute_evidence
);
criterion_main!(benches);
