//! Aggregation of canonical facts into metrics
//!
//! Everything here is synchronous and deterministic: the same facts in any order
//! produce the same [`AggregateMetrics`]. Every ratio with a zero denominator is 0.

mod duration_stats;
mod engine;
mod metrics;
mod stats;

pub use duration_stats::DurationStats;
pub use engine::aggregate;
pub use metrics::{
    ActivityMetrics, AggregateMetrics, CommitMetrics, ContributorMetrics, IssueMetrics, ItemMetrics, ProjectMetrics, PullRequestMetrics,
    ReleaseMetrics, RepositoryMetrics,
};
pub use stats::{activity_density, gini_coefficient, growth_rate, median, percentage, percentile, ratio, round2};
