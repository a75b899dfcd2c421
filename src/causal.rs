//! Confound-adjusted treatment effect via ordinary least squares
//!
//! Design matrix columns: `[intercept, treatment, confound_1 .. confound_k]`
//! over daily-aggregated values spanning the pre- and post-periods. The
//! adjusted effect is the treatment coefficient; each confound's coefficient
//! becomes its estimated impact.
//!
//! When `XᵀX` is not positive definite (typically collinear confound
//! columns) the engine falls back to the unadjusted difference in means and
//! never errors.

use crate::confound::{Confounder, ImpactDirection};
use crate::linalg::{solve_least_squares, Matrix};
use crate::model::{aggregate_daily, ConfidenceTier, DatedValue};
use crate::stats::mean;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the reported adjusted effect was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMethod {
    /// Normal equations solved through Cholesky
    Ols,
    /// Design matrix was singular; adjusted equals unadjusted
    UnadjustedFallback,
}

/// Naive and confound-adjusted treatment effect for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalInferenceResult {
    /// `mean(post) - mean(pre)`
    pub unadjusted_effect: f64,
    /// Treatment coefficient of the regression
    pub adjusted_effect: f64,
    /// Part of the naive effect explained by confounds
    pub adjustment_delta: f64,
    /// `[intercept, treatment, confound_1, ...]`
    pub coefficients: Vec<f64>,
    /// Confounders that entered the design, with impact filled in
    pub confounders: Vec<Confounder>,
    pub total_days: usize,
    pub active_confounders: usize,
    pub confidence: ConfidenceTier,
    pub method: AdjustmentMethod,
}

/// Estimate the treatment effect adjusted for `confounders`
///
/// `values` may contain several samples per day; they are averaged first.
/// Confound columns that are constant over the observed days carry no
/// information and are left out of the design.
pub fn adjust_for_confounders(
    values: &[DatedValue],
    protocol_start: NaiveDate,
    confounders: &[Confounder],
) -> CausalInferenceResult {
    let daily = aggregate_daily(values);
    let total_days = daily.len();

    let treated: Vec<f64> = daily
        .iter()
        .filter(|v| v.date >= protocol_start)
        .map(|v| v.value)
        .collect();
    let control: Vec<f64> = daily
        .iter()
        .filter(|v| v.date < protocol_start)
        .map(|v| v.value)
        .collect();
    let unadjusted_effect = if treated.is_empty() || control.is_empty() {
        0.0
    } else {
        mean(&treated) - mean(&control)
    };

    let active: Vec<&Confounder> = confounders
        .iter()
        .filter(|c| {
            let hits = daily.iter().filter(|v| c.affects(v.date)).count();
            hits > 0 && hits < total_days
        })
        .collect();

    let design: Matrix = daily
        .iter()
        .map(|v| {
            let mut row = Vec::with_capacity(2 + active.len());
            row.push(1.0);
            row.push(if v.date >= protocol_start { 1.0 } else { 0.0 });
            row.extend(active.iter().map(|c| if c.affects(v.date) { 1.0 } else { 0.0 }));
            row
        })
        .collect();
    let response: Vec<f64> = daily.iter().map(|v| v.value).collect();

    let confidence = if total_days >= 60 && active.len() <= 2 {
        ConfidenceTier::High
    } else if total_days >= 30 {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    };

    let solved = if design.is_empty() {
        None
    } else {
        match solve_least_squares(&design, &response) {
            Ok(beta) if beta.iter().all(|b| b.is_finite()) => Some(beta),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    days = total_days,
                    confounders = active.len(),
                    "causal adjustment fell back to unadjusted effect"
                );
                None
            }
        }
    };

    match solved {
        Some(beta) => {
            let adjusted_effect = beta[1];
            let estimated: Vec<Confounder> = active
                .iter()
                .zip(&beta[2..])
                .map(|(c, coefficient)| {
                    let mut c = (*c).clone();
                    c.estimated_impact = *coefficient;
                    c.direction = if *coefficient > 0.0 {
                        ImpactDirection::Raises
                    } else if *coefficient < 0.0 {
                        ImpactDirection::Lowers
                    } else {
                        ImpactDirection::Unknown
                    };
                    c
                })
                .collect();

            CausalInferenceResult {
                unadjusted_effect,
                adjusted_effect,
                adjustment_delta: unadjusted_effect - adjusted_effect,
                coefficients: beta,
                active_confounders: estimated.len(),
                confounders: estimated,
                total_days,
                confidence,
                method: AdjustmentMethod::Ols,
            }
        }
        None => CausalInferenceResult {
            unadjusted_effect,
            adjusted_effect: unadjusted_effect,
            adjustment_delta: 0.0,
            coefficients: vec![0.0, unadjusted_effect],
            active_confounders: active.len(),
            confounders: active.into_iter().cloned().collect(),
            total_days,
            confidence,
            method: AdjustmentMethod::UnadjustedFallback,
        },
    }
}
