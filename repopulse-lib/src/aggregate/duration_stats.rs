use super::stats::{median, nearest_rank, round2, sorted_copy};
use serde::{Deserialize, Serialize};

/// Summary of a set of durations, in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DurationStats {
    pub count: u64,
    pub mean: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl DurationStats {
    /// Summarizes `days`, ignoring negative and non-finite values.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "acceptable for statistics")]
    pub fn from_days(days: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = days.into_iter().filter(|d| d.is_finite() && *d >= 0.0).collect();
        if values.is_empty() {
            return Self::default();
        }

        let sorted = sorted_copy(&values);
        let n = sorted.len();

        Self {
            count: n as u64,
            mean: round2(sorted.iter().sum::<f64>() / n as f64),
            median: round2(median(&sorted)),
            p75: round2(nearest_rank(&sorted, 75.0)),
            p90: round2(nearest_rank(&sorted, 90.0)),
            p95: round2(nearest_rank(&sorted, 95.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(DurationStats::from_days([]), DurationStats::default());
    }

    #[test]
    fn test_summary() {
        let stats = DurationStats::from_days([10.0, 20.0, 5.0]);

        assert_eq!(stats.count, 3);
        assert!((stats.mean - 11.67).abs() < 1e-9);
        assert!((stats.median - 10.0).abs() < 1e-9);
        assert!((stats.p95 - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let stats = DurationStats::from_days([-1.0, f64::NAN, f64::INFINITY, 4.0]);

        assert_eq!(stats.count, 1);
        assert!((stats.mean - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_independent() {
        assert_eq!(
            DurationStats::from_days([1.5, 7.25, 3.0, 0.1]),
            DurationStats::from_days([0.1, 3.0, 7.25, 1.5])
        );
    }
}
