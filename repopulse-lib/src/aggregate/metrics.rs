use super::DurationStats;
use super::stats::{activity_density, gini_coefficient, growth_rate, median, percentage, ratio, round2};
use crate::facts::{ActivityWindow, Commit, Contributor, ContributorKind, Issue, ProjectItem, ProjectItemType, PullRequest, Release};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IssueMetrics {
    pub total: u64,
    pub open: u64,
    pub closed: u64,
    pub closed_percentage: f64,
    pub opened_in_window: u64,
    pub opened_previous_window: u64,
    pub opened_growth_rate: f64,
    pub closed_in_window: u64,
    /// Creation to close, for issues closed in the window.
    pub close_time_days: DurationStats,
    /// Age of the open issues at the end of the window.
    pub open_age_days: DurationStats,
}

impl IssueMetrics {
    pub(super) fn compute(issues: &[&Issue], window: &ActivityWindow) -> Self {
        let previous = window.previous();
        let total = count(issues.len());
        let open = count(issues.iter().filter(|i| i.is_open()).count());
        let closed = total - open;
        let opened_in_window = count(issues.iter().filter(|i| window.contains_opt(i.created_at)).count());
        let opened_previous_window = count(issues.iter().filter(|i| previous.contains_opt(i.created_at)).count());

        let closed_recently = || issues.iter().filter(|i| !i.is_open() && window.contains_opt(i.closed_at));

        Self {
            total,
            open,
            closed,
            closed_percentage: percentage(closed, total),
            opened_in_window,
            opened_previous_window,
            opened_growth_rate: growth_rate(opened_in_window, opened_previous_window),
            closed_in_window: count(closed_recently().count()),
            close_time_days: DurationStats::from_days(closed_recently().filter_map(|i| span_days(i.created_at, i.closed_at))),
            open_age_days: DurationStats::from_days(
                issues
                    .iter()
                    .filter(|i| i.is_open())
                    .filter_map(|i| span_days(i.created_at, Some(window.until))),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PullRequestMetrics {
    pub total: u64,
    pub open: u64,
    /// Closed pull requests, merged ones included.
    pub closed: u64,
    pub merged: u64,
    pub closed_percentage: f64,
    /// Share of closed pull requests that were merged.
    pub merge_ratio: f64,
    pub opened_in_window: u64,
    pub opened_previous_window: u64,
    pub opened_growth_rate: f64,
    pub merged_in_window: u64,
    /// Creation to merge, for pull requests merged in the window.
    pub merge_time_days: DurationStats,
}

impl PullRequestMetrics {
    pub(super) fn compute(pull_requests: &[&PullRequest], window: &ActivityWindow) -> Self {
        let previous = window.previous();
        let total = count(pull_requests.len());
        let open = count(pull_requests.iter().filter(|p| p.is_open()).count());
        let closed = total - open;
        let merged = count(pull_requests.iter().filter(|p| p.is_merged()).count());
        let opened_in_window = count(pull_requests.iter().filter(|p| window.contains_opt(p.created_at)).count());
        let opened_previous_window = count(pull_requests.iter().filter(|p| previous.contains_opt(p.created_at)).count());

        let merged_recently = || pull_requests.iter().filter(|p| p.is_merged() && window.contains_opt(p.merged_at));

        Self {
            total,
            open,
            closed,
            merged,
            closed_percentage: percentage(closed, total),
            merge_ratio: ratio(merged, closed),
            opened_in_window,
            opened_previous_window,
            opened_growth_rate: growth_rate(opened_in_window, opened_previous_window),
            merged_in_window: count(merged_recently().count()),
            merge_time_days: DurationStats::from_days(merged_recently().filter_map(|p| span_days(p.created_at, p.merged_at))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommitMetrics {
    pub in_window: u64,
    pub previous_window: u64,
    pub growth_rate: f64,
    /// Commits per day over the window.
    pub activity_density: f64,
    pub distinct_authors: u64,
    /// How unevenly the window's commits are spread over their authors.
    pub author_gini: f64,
}

impl CommitMetrics {
    pub(super) fn compute(commits: &[&Commit], window: &ActivityWindow) -> Self {
        let previous = window.previous();
        let recent: Vec<_> = commits.iter().filter(|c| window.contains_opt(c.activity_at())).collect();
        let in_window = count(recent.len());
        let previous_window = count(commits.iter().filter(|c| previous.contains_opt(c.activity_at())).count());

        let mut per_author: BTreeMap<&str, u64> = BTreeMap::new();
        for commit in &recent {
            *per_author.entry(commit.author_key()).or_default() += 1;
        }
        let per_author: Vec<u64> = per_author.into_values().collect();

        Self {
            in_window,
            previous_window,
            growth_rate: growth_rate(in_window, previous_window),
            activity_density: activity_density(in_window, window.elapsed_days()),
            distinct_authors: count(per_author.len()),
            author_gini: gini_coefficient(&per_author),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReleaseMetrics {
    pub total: u64,
    pub in_window: u64,
    pub prereleases: u64,
    pub latest_published_at: Option<DateTime<Utc>>,
    /// Median gap between consecutive published releases.
    pub median_days_between: f64,
}

impl ReleaseMetrics {
    pub(super) fn compute(releases: &[&Release], window: &ActivityWindow) -> Self {
        let mut published: Vec<DateTime<Utc>> = releases.iter().filter_map(|r| r.published_at).collect();
        published.sort_unstable();

        let gaps: Vec<f64> = published.windows(2).filter_map(|pair| span_days(Some(pair[0]), Some(pair[1]))).collect();

        Self {
            total: count(releases.len()),
            in_window: count(releases.iter().filter(|r| window.contains_opt(r.published_at)).count()),
            prereleases: count(releases.iter().filter(|r| r.is_prerelease).count()),
            latest_published_at: published.last().copied(),
            median_days_between: round2(median(&gaps)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContributorMetrics {
    pub count: u64,
    pub bots: u64,
    pub total_contributions: u64,
    pub contribution_gini: f64,
    /// Share of all contributions made by the most active contributor.
    pub top_contributor_share: f64,
}

impl ContributorMetrics {
    pub(super) fn compute(contributors: &[&Contributor]) -> Self {
        let contributions: Vec<u64> = contributors.iter().map(|c| c.contributions).collect();
        let total_contributions: u64 = contributions.iter().sum();
        let top = contributions.iter().copied().max().unwrap_or_default();

        Self {
            count: count(contributors.len()),
            bots: count(contributors.iter().filter(|c| c.kind == ContributorKind::Bot).count()),
            total_contributions,
            contribution_gini: gini_coefficient(&contributions),
            top_contributor_share: ratio(top, total_contributions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityMetrics {
    /// Issues and pull requests opened, commits landed and releases published in the window.
    pub events_in_window: u64,
    pub activity_density: f64,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl ActivityMetrics {
    pub(super) fn compute(
        issues: &IssueMetrics,
        pull_requests: &PullRequestMetrics,
        commits: &CommitMetrics,
        releases: &ReleaseMetrics,
        last_activity_at: Option<DateTime<Utc>>,
        window: &ActivityWindow,
    ) -> Self {
        let events_in_window = issues.opened_in_window + pull_requests.opened_in_window + commits.in_window + releases.in_window;

        Self {
            events_in_window,
            activity_density: activity_density(events_in_window, window.elapsed_days()),
            last_activity_at,
        }
    }
}

/// Every metric family for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RepositoryMetrics {
    pub issues: IssueMetrics,
    pub pull_requests: PullRequestMetrics,
    pub commits: CommitMetrics,
    pub releases: ReleaseMetrics,
    pub contributors: ContributorMetrics,
    pub activity: ActivityMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemMetrics {
    pub total: u64,
    pub by_type: BTreeMap<ProjectItemType, u64>,
    /// Items without a status are counted under an empty key.
    pub by_status: BTreeMap<String, u64>,
}

impl ItemMetrics {
    pub(super) fn compute(items: &[ProjectItem]) -> Self {
        let mut by_type: BTreeMap<ProjectItemType, u64> = BTreeMap::new();
        let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
        for item in items {
            *by_type.entry(item.content_type).or_default() += 1;
            *by_status.entry(item.status.clone().unwrap_or_default()).or_default() += 1;
        }

        Self {
            total: count(items.len()),
            by_type,
            by_status,
        }
    }
}

/// Metric families computed over the union of every collected repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectMetrics {
    pub repository_count: u64,
    pub issues: IssueMetrics,
    pub pull_requests: PullRequestMetrics,
    pub commits: CommitMetrics,
    pub releases: ReleaseMetrics,
    pub contributors: ContributorMetrics,
    pub activity: ActivityMetrics,
    /// How unevenly the window's commits are spread over the repositories.
    pub commit_distribution_gini: f64,
    pub items: ItemMetrics,
}

/// The result of aggregating one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AggregateMetrics {
    /// Keyed by `owner/name`.
    pub per_repository: BTreeMap<String, RepositoryMetrics>,
    pub per_project: ProjectMetrics,
}

pub(super) fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[expect(clippy::cast_precision_loss, reason = "acceptable for duration")]
fn span_days(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<f64> {
    Some((to? - from?).num_seconds() as f64 / SECONDS_PER_DAY)
}
