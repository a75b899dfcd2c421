// Effect Size Engine
//
// Compares a pre-intervention sample against a post-intervention sample:
// - Cohen's d with a pooled (n - 1) standard deviation
// - 95% confidence interval on d
// - Welch's t-test when both groups have at least 5 values
// - Post-hoc power from the harmonic mean sample size
//
// Both samples are fenced at 1.5 x IQR before anything is computed. The
// baseline engine uses a wider 3 x IQR fence; the two multipliers differ on
// purpose and are pending product-owner confirmation.
//
// Scientific Foundation:
// [1] Cohen, J. (1988). Statistical Power Analysis for the Behavioral Sciences.
// [2] Welch, B. L. (1947). The generalization of "Student's" problem when
//     several different population variances are involved. Biometrika 34.

mod engine;
mod result;
mod welch;

pub use engine::{compute_effect_size, EFFECT_SIZE_IQR_MULTIPLIER};
pub use result::{ConfidenceInterval, EffectDirection, EffectSizeResult, Magnitude};
pub use welch::{welch_t_test, WelchTest, MIN_WELCH_SAMPLE};
