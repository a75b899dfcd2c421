// Cohen's d, confidence interval and power for a before/after comparison

use crate::effect_size::result::{
    ConfidenceInterval, EffectDirection, EffectSizeResult, Magnitude,
};
use crate::effect_size::welch::welch_t_test;
use crate::math::normal_cdf;
use crate::stats::{mean, safe_divide, sample_variance, split_outliers};

/// IQR fence applied to both samples before any effect-size statistic
pub const EFFECT_SIZE_IQR_MULTIPLIER: f64 = 1.5;

const Z_95: f64 = 1.96;

/// Compute the standardized effect of `after` relative to `before`
///
/// Never panics and never yields NaN: an empty sample produces
/// [`EffectSizeResult::empty`], a zero pooled deviation produces `d = 0`.
///
/// # Example
/// ```
/// use veredicto::effect_size::{compute_effect_size, Magnitude};
///
/// let before = [60.0, 62.0, 58.0, 61.0, 63.0, 59.0, 64.0];
/// let after = [70.0, 72.0, 68.0, 71.0, 73.0, 69.0, 74.0];
///
/// let effect = compute_effect_size(&before, &after);
/// assert_eq!(effect.magnitude, Magnitude::Large);
/// assert!(effect.p_value.unwrap() < 0.05);
/// ```
pub fn compute_effect_size(before: &[f64], after: &[f64]) -> EffectSizeResult {
    if before.is_empty() || after.is_empty() {
        return EffectSizeResult::empty();
    }

    let before_split = split_outliers(before, EFFECT_SIZE_IQR_MULTIPLIER);
    let after_split = split_outliers(after, EFFECT_SIZE_IQR_MULTIPLIER);
    let before = &before_split.kept;
    let after = &after_split.kept;
    if before.is_empty() || after.is_empty() {
        return EffectSizeResult::empty();
    }

    let n1 = before.len() as f64;
    let n2 = after.len() as f64;
    let before_mean = mean(before);
    let after_mean = mean(after);
    let absolute_change = after_mean - before_mean;

    let pooled_variance = safe_divide(
        (n1 - 1.0) * sample_variance(before) + (n2 - 1.0) * sample_variance(after),
        n1 + n2 - 2.0,
    );
    let pooled_std = pooled_variance.sqrt();
    let cohens_d = safe_divide(absolute_change, pooled_std);

    let percent_change = safe_divide(absolute_change, before_mean.abs()) * 100.0;

    let standard_error =
        ((n1 + n2) / (n1 * n2) + cohens_d.powi(2) / (2.0 * (n1 + n2))).sqrt();
    let confidence_interval = ConfidenceInterval {
        lower: cohens_d - Z_95 * standard_error,
        upper: cohens_d + Z_95 * standard_error,
    };

    let welch = welch_t_test(before, after);

    let magnitude = Magnitude::from_cohens_d(cohens_d);
    let direction = match magnitude {
        Magnitude::Negligible => EffectDirection::Neutral,
        _ if cohens_d > 0.0 => EffectDirection::Increase,
        _ => EffectDirection::Decrease,
    };

    EffectSizeResult {
        cohens_d,
        percent_change,
        absolute_change,
        standard_error,
        confidence_interval,
        t_value: welch.map(|w| w.t_value),
        p_value: welch.map(|w| w.p_value),
        degrees_of_freedom: welch.map(|w| w.degrees_of_freedom),
        power_estimate: power_estimate(cohens_d, n1, n2),
        magnitude,
        direction,
        before_mean,
        after_mean,
        before_n: before.len(),
        after_n: after.len(),
        outliers_removed: before_split.removed_count() + after_split.removed_count(),
    }
}

/// Post-hoc power of a two-sided test at alpha = 0.05
fn power_estimate(cohens_d: f64, n1: f64, n2: f64) -> f64 {
    let harmonic_n = safe_divide(2.0 * n1 * n2, n1 + n2);
    let power = 1.0 - normal_cdf(Z_95 - cohens_d.abs() * (harmonic_n / 2.0).sqrt());
    power.clamp(0.0, 1.0)
}
