// Welch's unequal-variance t-test
//
// Hand-rolled on top of crate::math::t_cdf so the whole p-value path is
// deterministic and dependency free.

use crate::math::t_cdf;
use crate::stats::{mean, safe_divide, sample_variance};
use serde::{Deserialize, Serialize};

/// Smallest group size for which a t-test is attempted
pub const MIN_WELCH_SAMPLE: usize = 5;

/// Result of Welch's two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    /// t statistic of `after - before`
    pub t_value: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
}

/// Compare `before` against `after` with Welch's t-test
///
/// Returns `None` when either group has fewer than [`MIN_WELCH_SAMPLE`]
/// values, or when both groups are constant (the standard error is 0).
pub fn welch_t_test(before: &[f64], after: &[f64]) -> Option<WelchTest> {
    if before.len() < MIN_WELCH_SAMPLE || after.len() < MIN_WELCH_SAMPLE {
        return None;
    }

    let n1 = before.len() as f64;
    let n2 = after.len() as f64;
    let se1 = sample_variance(before) / n1;
    let se2 = sample_variance(after) / n2;
    let standard_error = (se1 + se2).sqrt();
    if standard_error == 0.0 {
        return None;
    }

    let t_value = (mean(after) - mean(before)) / standard_error;

    let denominator = se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0);
    let degrees_of_freedom = if denominator == 0.0 {
        n1 + n2 - 2.0
    } else {
        safe_divide((se1 + se2).powi(2), denominator)
    };

    let p_value = (2.0 * (1.0 - t_cdf(t_value.abs(), degrees_of_freedom))).clamp(0.0, 1.0);

    Some(WelchTest {
        t_value,
        p_value,
        degrees_of_freedom,
    })
}
