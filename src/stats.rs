//! Descriptive statistics helpers
//!
//! Plain f64 slice functions shared by the baseline, effect-size and signal
//! engines. Every division goes through [`safe_divide`] so callers never see
//! NaN or infinity.

/// Divide, returning 0 instead of NaN/infinity when the denominator is 0
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    safe_divide(values.iter().sum(), values.len() as f64)
}

/// Sample variance (n - 1 denominator), 0 below two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Population standard deviation (n denominator)
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Coefficient of variation as a percentage (std / |mean| * 100)
pub fn coefficient_of_variation(std_dev: f64, mean: f64) -> f64 {
    safe_divide(std_dev, mean.abs()) * 100.0
}

/// Linearly interpolated percentile of already-sorted data
///
/// `p` is in percent (0-100). Returns 0 for empty input.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let index = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Copy and sort ascending, dropping non-finite values
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Values kept and removed by an IQR fence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierSplit {
    pub kept: Vec<f64>,
    pub removed: Vec<f64>,
}

impl OutlierSplit {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Minimum sample length for which quartiles are meaningful enough to fence
pub const MIN_IQR_SAMPLE: usize = 4;

/// Split `values` around `[Q1 - k*IQR, Q3 + k*IQR]`, preserving input order
///
/// Samples shorter than [`MIN_IQR_SAMPLE`] pass through untouched.
pub fn split_outliers(values: &[f64], multiplier: f64) -> OutlierSplit {
    if values.len() < MIN_IQR_SAMPLE {
        return OutlierSplit {
            kept: values.to_vec(),
            removed: Vec::new(),
        };
    }

    let sorted = sorted_finite(values);
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    let (kept, removed) = values
        .iter()
        .copied()
        .partition(|v| v.is_finite() && *v >= lower && *v <= upper);

    OutlierSplit { kept, removed }
}

/// Pearson correlation coefficient, `None` below three pairs or with zero variance
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = mean(xs);
    let my = mean(ys);

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }

    let denom = (vx * vy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}
