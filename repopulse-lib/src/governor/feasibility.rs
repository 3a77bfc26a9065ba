use crate::collect::CollectOptions;
use crate::source::QuotaSnapshot;
use chrono::{DateTime, Utc};
use core::time::Duration;

/// The number of source calls a collection is expected to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEstimate {
    pub per_repository: u64,
    pub repositories: u64,
    pub total: u64,
}

/// Estimates the calls needed to collect `repositories` repositories.
///
/// Each repository costs one call for its metadata plus enough pages to reach the limit of every
/// entity kind with a non-zero limit. The estimate is an upper bound; listings that run out early
/// use fewer calls.
#[must_use]
pub fn estimate_required_calls(repositories: usize, options: &CollectOptions) -> CallEstimate {
    let per_repository = 1 + options
        .limits
        .per_repository()
        .iter()
        .filter(|(_, limit)| *limit > 0)
        .map(|(_, limit)| options.pages_for(*limit))
        .sum::<u64>();

    let repositories = u64::try_from(repositories).unwrap_or(u64::MAX);
    CallEstimate {
        per_repository,
        repositories,
        total: per_repository.saturating_mul(repositories),
    }
}

/// Whether the remaining quota covers an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feasibility {
    pub feasible: bool,
    /// Time until the quota resets when infeasible, zero otherwise.
    pub suggested_wait: Duration,
    pub estimate: u64,
    pub remaining: u64,
    per_repository: u64,
}

/// Compares an estimate with the quota that will be available at `now`.
#[must_use]
pub fn check_feasible(estimate: &CallEstimate, quota: &QuotaSnapshot, now: DateTime<Utc>) -> Feasibility {
    let remaining = quota.available_at(now);
    let feasible = estimate.total <= remaining;
    let suggested_wait = if feasible {
        Duration::ZERO
    } else {
        (quota.reset_at - now).to_std().unwrap_or(Duration::ZERO)
    };

    Feasibility {
        feasible,
        suggested_wait,
        estimate: estimate.total,
        remaining,
        per_repository: estimate.per_repository,
    }
}

impl Feasibility {
    /// How many repositories may be collected at once: bounded by the configured maximum, the
    /// number of repositories, and how many repositories the remaining quota can pay for. Never zero.
    #[must_use]
    pub fn concurrency_limit(&self, max_concurrency: usize, repo_count: usize) -> usize {
        let affordable = usize::try_from(self.remaining / self.per_repository.max(1)).unwrap_or(usize::MAX);
        max_concurrency.min(repo_count).min(affordable.max(1)).max(1)
    }
}
