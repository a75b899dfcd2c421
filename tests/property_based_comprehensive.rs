//! Property-based tests for the numerical core
//!
//! Covers the invariants every engine leans on:
//! 1. Percentile and safe arithmetic never produce NaN
//! 2. Effect size is zero for identical samples and bounded otherwise
//! 3. Incomplete beta and t-CDF stay inside [0, 1]
//! 4. Cholesky least squares recovers noiseless coefficients
//! 5. Confidence scores stay inside their clamp

use proptest::prelude::*;
use veredicto::effect_size::{compute_effect_size, EffectDirection, Magnitude};
use veredicto::linalg::solve_least_squares;
use veredicto::math::{incomplete_beta, t_cdf};
use veredicto::model::ConfidenceTier;
use veredicto::stats::{percentile, safe_divide, sorted_finite};
use veredicto::verdict::{score_confidence, ConfidenceInputs};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_percentile_median_matches_definition(
        values in prop::collection::vec(-1000.0f64..1000.0, 1..40),
    ) {
        let sorted = sorted_finite(&values);
        let median = percentile(&sorted, 50.0);
        let n = sorted.len();
        let expected = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        prop_assert!((median - expected).abs() < 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_percentile_is_monotone(
        values in prop::collection::vec(-1000.0f64..1000.0, 1..40),
        a in 0.0f64..100.0,
        b in 0.0f64..100.0,
    ) {
        let sorted = sorted_finite(&values);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(percentile(&sorted, lo) <= percentile(&sorted, hi));
        prop_assert!(percentile(&sorted, lo) >= sorted[0]);
        prop_assert!(percentile(&sorted, hi) <= sorted[sorted.len() - 1]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_safe_divide_is_always_finite(
        numerator in prop::num::f64::ANY,
        denominator in prop::num::f64::ANY,
    ) {
        prop_assert!(safe_divide(numerator, denominator).is_finite());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_identical_samples_have_zero_effect(
        values in prop::collection::vec(0.0f64..200.0, 1..30),
    ) {
        let effect = compute_effect_size(&values, &values);
        prop_assert_eq!(effect.cohens_d, 0.0);
        prop_assert_eq!(effect.magnitude, Magnitude::Negligible);
        prop_assert_eq!(effect.direction, EffectDirection::Neutral);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_effect_size_never_nan(
        before in prop::collection::vec(-500.0f64..500.0, 0..25),
        after in prop::collection::vec(-500.0f64..500.0, 0..25),
    ) {
        let effect = compute_effect_size(&before, &after);
        prop_assert!(effect.cohens_d.is_finite());
        prop_assert!(effect.percent_change.is_finite());
        prop_assert!(effect.power_estimate.is_finite());
        prop_assert!((0.0..=1.0).contains(&effect.power_estimate));
        if let Some(p) = effect.p_value {
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_incomplete_beta_in_unit_interval(
        x in -0.5f64..1.5,
        a in 0.5f64..30.0,
        b in 0.5f64..30.0,
    ) {
        let value = incomplete_beta(x, a, b);
        prop_assert!(value.is_finite());
        prop_assert!((-1e-9..=1.0 + 1e-9).contains(&value));
    }

    #[test]
    fn prop_t_cdf_in_unit_interval(t in -50.0f64..50.0, df in 1.0f64..200.0) {
        let value = t_cdf(t, df);
        prop_assert!((-1e-9..=1.0 + 1e-9).contains(&value));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_least_squares_recovers_coefficients(
        b0 in -50.0f64..50.0,
        b1 in -20.0f64..20.0,
        b2 in -20.0f64..20.0,
        n in 12usize..60,
    ) {
        let design: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let treatment = if i >= n / 2 { 1.0 } else { 0.0 };
                let confound = if i % 3 == 0 { 1.0 } else { 0.0 };
                vec![1.0, treatment, confound]
            })
            .collect();
        let response: Vec<f64> = design
            .iter()
            .map(|row| b0 + b1 * row[1] + b2 * row[2])
            .collect();

        let beta = solve_least_squares(&design, &response).unwrap();
        prop_assert!((beta[0] - b0).abs() < 1e-6);
        prop_assert!((beta[1] - b1).abs() < 1e-6);
        prop_assert!((beta[2] - b2).abs() < 1e-6);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_confidence_score_is_clamped(
        days in -10i64..400,
        significant in 0usize..6,
        strong in 0usize..6,
        completeness in 0.0f64..1.0,
        outlier_rate in 0.0f64..0.5,
        impact in 0u8..4,
    ) {
        use veredicto::confound::ConfoundImpact;

        let confound_impact = match impact {
            0 => ConfoundImpact::None,
            1 => ConfoundImpact::Low,
            2 => ConfoundImpact::Medium,
            _ => ConfoundImpact::High,
        };
        let score = score_confidence(&ConfidenceInputs {
            days_on_protocol: days,
            confound_impact,
            significant_signals: significant,
            strong_signals: strong,
            completeness,
            outlier_rate,
        });

        prop_assert!((20..=95).contains(&score.score));
        let expected_tier = if score.score >= 70 {
            ConfidenceTier::High
        } else if score.score >= 45 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };
        prop_assert_eq!(score.tier, expected_tier);
    }
}
