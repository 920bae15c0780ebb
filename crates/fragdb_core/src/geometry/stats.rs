//! Small descriptive statistics used by the restraint checks.
//!
//! Degenerate input (empty, or one value where a spread is needed) yields
//! `0.0` rather than an error.

/// Critical values of the Nalimov test (95 %), keyed by degrees of freedom.
const NALIMOV_CRITICAL: [(usize, f64); 21] = [
    (1, 1.409),
    (2, 1.645),
    (3, 1.757),
    (4, 1.814),
    (5, 1.848),
    (6, 1.870),
    (7, 1.885),
    (8, 1.895),
    (9, 1.903),
    (10, 1.910),
    (11, 1.916),
    (12, 1.920),
    (13, 1.923),
    (14, 1.926),
    (15, 1.928),
    (16, 1.931),
    (17, 1.933),
    (18, 1.935),
    (19, 1.936),
    (20, 1.937),
    (30, 1.945),
];

/// Degrees of freedom above the table use the df=30 value.
const NALIMOV_DEFAULT_DF: usize = 30;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (divisor `n - 1`).
///
/// Single pass over deviations from the first value, which keeps the sums
/// small for tightly clustered distances.
pub fn std_dev(values: &[f64]) -> f64 {
    let Some(&shift) = values.first() else {
        return 0.0;
    };
    if values.len() < 2 {
        return 0.0;
    }

    let (sum, sum_sq) = values.iter().fold((0.0, 0.0), |(sum, sum_sq), value| {
        let d = value - shift;
        (sum + d, sum_sq + d * d)
    });
    let n = values.len() as f64;
    let variance = (sum_sq - sum * sum / n) / (n - 1.0);
    variance.max(0.0).sqrt()
}

/// Indices of values the Nalimov test marks as outliers.
///
/// Returns an empty list for fewer than four values (df < 2).
pub fn nalimov_outliers(values: &[f64]) -> Vec<usize> {
    let n = values.len();
    if n < 4 {
        return Vec::new();
    }
    let df = n - 2;
    let Some(critical) = critical_value(df) else {
        return Vec::new();
    };

    let stdev = std_dev(values);
    if stdev == 0.0 {
        return Vec::new();
    }
    let center = median(values);
    let factor = (n as f64 / (n as f64 - 1.0)).sqrt();

    values
        .iter()
        .enumerate()
        .filter(|(_, value)| ((*value - center) / stdev).abs() * factor >= critical)
        .map(|(index, _)| index)
        .collect()
}

fn critical_value(df: usize) -> Option<f64> {
    let key = if df > 20 { NALIMOV_DEFAULT_DF } else { df };
    NALIMOV_CRITICAL
        .iter()
        .find(|(entry, _)| *entry == key)
        .map(|(_, value)| *value)
}
