//! Pure numeric helpers shared by every metric family.
//!
//! None of these functions mutate their input; the ones that need an ordering sort a copy.

#![expect(clippy::cast_precision_loss, reason = "counts used in statistics are far below f64 precision limits")]

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator` rounded to two decimals, or 0 when the denominator is 0.
#[must_use]
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    round2(numerator as f64 / denominator as f64)
}

/// `numerator / denominator` as a whole percentage, or 0 when the denominator is 0.
#[must_use]
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    (numerator as f64 / denominator as f64 * 100.0).round()
}

/// Relative change from `previous` to `current`.
///
/// Growth from nothing counts as 1 (100 %), no activity in either period counts as 0.
#[must_use]
pub fn growth_rate(current: u64, previous: u64) -> f64 {
    match (current, previous) {
        (0, 0) => 0.0,
        (_, 0) => 1.0,
        _ => round2((current as f64 - previous as f64) / previous as f64),
    }
}

/// Gini coefficient of a distribution: 0 for perfect equality, approaching 1 as a single
/// value dominates. Empty and all-zero distributions are 0.
#[must_use]
pub fn gini_coefficient(values: &[u64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let total: u128 = sorted.iter().map(|v| u128::from(*v)).sum();
    if sorted.is_empty() || total == 0 {
        return 0.0;
    }

    let weighted: u128 = sorted.iter().zip(1_u128..).map(|(v, i)| i * u128::from(*v)).sum();
    let n = sorted.len() as f64;
    let gini = round2((2.0 * weighted as f64) / (n * total as f64) - (n + 1.0) / n);

    if gini > 0.0 { gini } else { 0.0 }
}

/// Median of `values`; the mean of the two middle values for even lengths. Empty is 0.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted_copy(values);
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => f64::midpoint(sorted[n / 2 - 1], sorted[n / 2]),
    }
}

/// Nearest-rank percentile of `values`, with `p` in `0..=100`. Empty is 0.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    nearest_rank(&sorted_copy(values), p)
}

/// Events per day, rounded to two decimals. An empty or inverted period is 0.
#[must_use]
pub fn activity_density(event_count: u64, elapsed_days: f64) -> f64 {
    if elapsed_days.is_nan() || elapsed_days <= 0.0 {
        return 0.0;
    }

    round2(event_count as f64 / elapsed_days)
}

pub(super) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub(super) fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };

    #[expect(clippy::cast_possible_truncation, reason = "index calculation")]
    #[expect(clippy::cast_sign_loss, reason = "value is clamped to non-negative range")]
    let idx = (p / 100.0 * last as f64).round().clamp(0.0, last as f64) as usize;
    sorted[idx]
}
