// fetch -> compute -> persist for one protocol

use crate::baseline::compute_baseline;
use crate::causal::adjust_for_confounders;
use crate::config::EngineConfig;
use crate::confound::{assess_impact, ConfoundAssessment, ConfoundDetector, ObservationWindow};
use crate::effect_size::{compute_effect_size, EffectSizeResult, Magnitude};
use crate::mechanism::{detect_mechanisms, ObservedSignal};
use crate::model::{aggregate_daily, DateRange, DatedValue, MetricType};
use crate::pipeline::{
    BiomarkerCorrelation, BiomarkerSource, MetricEvidence, ProtocolEvidence, Repositories,
};
use crate::robustness::{analyze_robustness, MetricWindow};
use crate::signal::classify_signal_with_lookback;
use crate::stats::{pearson_correlation, safe_divide};
use crate::verdict::{
    determine_verdict, partition_signals, score_confidence, ConfidenceInputs, SignalPolarity,
    VerdictInput,
};
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// Minimum matching dates for a biomarker correlation
const MIN_CORRELATION_PAIRS: usize = 3;

/// Per-run options for [`compute_evidence`]
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceOptions {
    /// Evaluation date; the post-period never extends past it
    pub as_of: NaiveDate,
    pub config: EngineConfig,
    /// Metrics to analyze; `None` means every metric the store has
    pub metrics: Option<Vec<MetricType>>,
}

impl EvidenceOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            config: EngineConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<MetricType>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

fn days_before(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
        .with_context(|| format!("date out of range: {date} minus {days} days"))
}

fn values_in(series: &[DatedValue], range: DateRange) -> Vec<DatedValue> {
    series
        .iter()
        .filter(|v| range.contains(v.date))
        .copied()
        .collect()
}

/// Compute, persist and return the evidence for one protocol
///
/// Fails only when the configuration is invalid, the protocol is unknown or
/// a collaborator fails. Sparse data never fails; it shows up as missing
/// baselines, null p-values and early verdicts instead.
pub fn compute_evidence(
    repos: &Repositories<'_>,
    user_id: &str,
    protocol_id: &str,
    options: &EvidenceOptions,
) -> Result<ProtocolEvidence> {
    let config = &options.config;
    config.validate().context("invalid engine configuration")?;

    let protocol = repos
        .protocols
        .protocol(user_id, protocol_id)
        .context("failed to query protocol registry")?
        .with_context(|| format!("protocol '{protocol_id}' not found for user '{user_id}'"))?;

    let start = protocol.start_date;
    let post_end = protocol
        .end_date
        .map_or(options.as_of, |end| end.min(options.as_of));
    let days_on_protocol = (post_end - start).num_days().max(0);

    let baseline_end = days_before(start, 1)?;
    let pre_start = days_before(start, config.pre_window_days)?;
    let pre_period = DateRange::new(pre_start, baseline_end);
    let post_period = DateRange::new(start, post_end);
    let window = ObservationWindow {
        pre_start,
        protocol_start: start,
        end: post_end,
    };
    let fetch_start = pre_start.min(days_before(baseline_end, config.baseline_window_days)?);
    let fetch_range = DateRange::new(fetch_start, post_end.max(baseline_end));

    tracing::debug!(
        user = user_id,
        protocol = protocol_id,
        days_on_protocol,
        "computing evidence"
    );

    // Confounds over the whole observation window
    let notes = repos
        .annotations
        .notes(user_id, window.full())
        .context("failed to fetch daily notes")?;
    let events = repos
        .annotations
        .events(user_id, window.full())
        .context("failed to fetch confound events")?;
    let protocols = repos
        .protocols
        .protocols(user_id)
        .context("failed to list protocols")?;
    let detector = ConfoundDetector::new().context("failed to build keyword matcher")?;
    let confounders = detector.detect(&window, protocol_id, &notes, &events, &protocols);
    let confounds = assess_impact(confounders, post_period);

    let metric_types = match &options.metrics {
        Some(metrics) => metrics.clone(),
        None => repos
            .metrics
            .available_metrics(user_id)
            .context("failed to list available metrics")?,
    };

    let mut metrics = Vec::new();
    let mut windows = Vec::new();
    let mut daily_series = BTreeMap::new();
    for metric in metric_types {
        let raw = repos
            .metrics
            .samples(user_id, metric, fetch_range)
            .with_context(|| format!("failed to fetch samples for {metric}"))?;
        let daily = aggregate_daily(&raw);
        if daily.is_empty() {
            tracing::debug!(metric = %metric, "no samples in observation window");
            continue;
        }

        let before: Vec<f64> = values_in(&daily, pre_period).iter().map(|v| v.value).collect();
        let after = values_in(&daily, post_period);
        let after_values: Vec<f64> = after.iter().map(|v| v.value).collect();

        let baseline = compute_baseline(metric, &daily, baseline_end, &config.baseline_options());
        let signal = match &baseline {
            Some(b) => classify_signal_with_lookback(&after, b, config.signal_lookback_days),
            None => {
                tracing::debug!(metric = %metric, "no baseline, signal classification skipped");
                None
            }
        };

        let effect = compute_effect_size(&before, &after_values);
        let causal = adjust_for_confounders(
            &values_in(&daily, window.full()),
            start,
            &confounds.confounders,
        );

        metrics.push(MetricEvidence {
            metric,
            polarity: SignalPolarity::of(metric, &effect),
            pre_days: before.len(),
            post_days: after.len(),
            baseline,
            effect,
            signal,
            causal,
        });
        windows.push(MetricWindow {
            metric,
            before,
            after,
        });
        daily_series.insert(metric, daily);
    }

    let effects: Vec<(MetricType, &EffectSizeResult)> =
        metrics.iter().map(|m| (m.metric, &m.effect)).collect();
    let confidence = score_confidence(&confidence_inputs(
        days_on_protocol,
        &confounds,
        &effects,
        &metrics,
        post_period,
        config.significance_level,
    ));

    let (positive_signals, adverse_signals) = partition_signals(effects.iter().copied());
    let verdict_input = VerdictInput {
        days_on_protocol,
        positive_signals,
        adverse_signals,
        confound_impact: confounds.impact,
        confidence: confidence.tier,
        significance_level: config.significance_level,
    };
    let verdict = determine_verdict(&verdict_input);

    let observed: Vec<ObservedSignal> = metrics
        .iter()
        .map(|m| ObservedSignal {
            metric: m.metric,
            direction: m.effect.direction,
            magnitude: m.effect.magnitude,
        })
        .collect();
    let mechanisms = detect_mechanisms(&observed);

    let robustness = analyze_robustness(
        &verdict_input,
        &windows,
        post_period,
        config.strict_significance_level,
    );

    let biomarker_correlations = match repos.biomarkers {
        Some(source) => match correlate_biomarkers(source, user_id, fetch_range, &daily_series) {
            Ok(found) if !found.is_empty() => Some(found),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "biomarker correlation failed, field omitted");
                None
            }
        },
        None => None,
    };

    let evidence = ProtocolEvidence {
        user_id: user_id.to_string(),
        protocol_id: protocol_id.to_string(),
        protocol_name: protocol.name.clone(),
        as_of: options.as_of,
        days_on_protocol,
        pre_period,
        post_period,
        verdict,
        confidence,
        metrics,
        confounds,
        mechanisms,
        robustness,
        biomarker_correlations,
    };

    repos
        .sink
        .upsert(&evidence)
        .context("failed to persist evidence")?;

    tracing::debug!(
        verdict = %evidence.verdict,
        confidence = evidence.confidence.score,
        metrics = evidence.metrics.len(),
        "evidence computed"
    );
    Ok(evidence)
}

fn confidence_inputs(
    days_on_protocol: i64,
    confounds: &ConfoundAssessment,
    effects: &[(MetricType, &EffectSizeResult)],
    metrics: &[MetricEvidence],
    post_period: DateRange,
    significance_level: f64,
) -> ConfidenceInputs {
    let significant_signals = effects
        .iter()
        .filter(|(_, e)| e.magnitude != Magnitude::Negligible && e.is_significant(significance_level))
        .count();
    let strong_signals = effects
        .iter()
        .filter(|(_, e)| e.magnitude.is_medium_or_large())
        .count();

    let expected_days = post_period.len_days() as f64;
    let completeness = if metrics.is_empty() {
        0.0
    } else {
        let total: f64 = metrics
            .iter()
            .map(|m| safe_divide(m.post_days as f64, expected_days).min(1.0))
            .sum();
        total / metrics.len() as f64
    };

    let removed: usize = effects.iter().map(|(_, e)| e.outliers_removed).sum();
    let seen: usize = effects
        .iter()
        .map(|(_, e)| e.before_n + e.after_n + e.outliers_removed)
        .sum();

    ConfidenceInputs {
        days_on_protocol,
        confound_impact: confounds.impact,
        significant_signals,
        strong_signals,
        completeness,
        outlier_rate: safe_divide(removed as f64, seen as f64),
    }
}

/// Pearson correlation between each biomarker and each metric's daily values
fn correlate_biomarkers(
    source: &dyn BiomarkerSource,
    user_id: &str,
    range: DateRange,
    daily_series: &BTreeMap<MetricType, Vec<DatedValue>>,
) -> Result<Vec<BiomarkerCorrelation>> {
    let readings = source
        .biomarkers(user_id, range)
        .context("failed to fetch biomarkers")?;

    let mut by_name: BTreeMap<&str, Vec<DatedValue>> = BTreeMap::new();
    for reading in &readings {
        by_name
            .entry(reading.name.as_str())
            .or_default()
            .push(DatedValue::new(reading.date, reading.value));
    }

    let mut correlations = Vec::new();
    for (name, values) in by_name {
        let biomarker = aggregate_daily(&values);
        for (metric, daily) in daily_series {
            let metric_by_date: BTreeMap<NaiveDate, f64> =
                daily.iter().map(|v| (v.date, v.value)).collect();
            let (xs, ys): (Vec<f64>, Vec<f64>) = biomarker
                .iter()
                .filter_map(|b| metric_by_date.get(&b.date).map(|m| (b.value, *m)))
                .unzip();
            if xs.len() < MIN_CORRELATION_PAIRS {
                continue;
            }
            if let Some(correlation) = pearson_correlation(&xs, &ys) {
                correlations.push(BiomarkerCorrelation {
                    biomarker: name.to_string(),
                    metric: *metric,
                    correlation,
                    pairs: xs.len(),
                });
            }
        }
    }
    Ok(correlations)
}
