use super::metrics::{
    ActivityMetrics, AggregateMetrics, CommitMetrics, ContributorMetrics, IssueMetrics, ItemMetrics, ProjectMetrics, PullRequestMetrics,
    ReleaseMetrics, RepositoryMetrics, count,
};
use super::stats::gini_coefficient;
use crate::facts::{ActivityWindow, Commit, Contributor, ContributorKind, Issue, ProjectItem, PullRequest, Release, RepoFacts};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const LOG_TARGET: &str = " aggregate";

/// Computes per-repository and project-wide metrics.
///
/// The result depends only on the content of `facts` and `items`, never on their order.
#[must_use]
pub fn aggregate(facts: &[RepoFacts], items: &[ProjectItem], window: &ActivityWindow) -> AggregateMetrics {
    log::info!(
        target: LOG_TARGET,
        "Aggregating {} repositories and {} project item(s) over {} to {}",
        facts.len(),
        items.len(),
        window.since,
        window.until
    );

    let per_repository: BTreeMap<String, RepositoryMetrics> = facts.iter().map(|f| (f.spec.full_name(), repository_metrics(f, window))).collect();

    let issues: Vec<&Issue> = facts.iter().flat_map(|f| &f.issues).collect();
    let pull_requests: Vec<&PullRequest> = facts.iter().flat_map(|f| &f.pull_requests).collect();
    let commits: Vec<&Commit> = facts.iter().flat_map(|f| &f.commits).collect();
    let releases: Vec<&Release> = facts.iter().flat_map(|f| &f.releases).collect();
    let contributors = merge_contributors(facts);
    let contributors: Vec<&Contributor> = contributors.iter().collect();
    let last_activity_at = per_repository.values().filter_map(|m| m.activity.last_activity_at).max();

    let families = metric_families(&issues, &pull_requests, &commits, &releases, &contributors, last_activity_at, window);
    let commits_per_repository: Vec<u64> = per_repository.values().map(|m| m.commits.in_window).collect();

    AggregateMetrics {
        per_project: ProjectMetrics {
            repository_count: count(per_repository.len()),
            issues: families.issues,
            pull_requests: families.pull_requests,
            commits: families.commits,
            releases: families.releases,
            contributors: families.contributors,
            activity: families.activity,
            commit_distribution_gini: gini_coefficient(&commits_per_repository),
            items: ItemMetrics::compute(items),
        },
        per_repository,
    }
}

fn repository_metrics(facts: &RepoFacts, window: &ActivityWindow) -> RepositoryMetrics {
    let issues: Vec<&Issue> = facts.issues.iter().collect();
    let pull_requests: Vec<&PullRequest> = facts.pull_requests.iter().collect();
    let commits: Vec<&Commit> = facts.commits.iter().collect();
    let releases: Vec<&Release> = facts.releases.iter().collect();
    let contributors: Vec<&Contributor> = facts.contributors.iter().collect();

    metric_families(&issues, &pull_requests, &commits, &releases, &contributors, last_activity(facts), window)
}

fn metric_families(
    issues: &[&Issue],
    pull_requests: &[&PullRequest],
    commits: &[&Commit],
    releases: &[&Release],
    contributors: &[&Contributor],
    last_activity_at: Option<DateTime<Utc>>,
    window: &ActivityWindow,
) -> RepositoryMetrics {
    let issues = IssueMetrics::compute(issues, window);
    let pull_requests = PullRequestMetrics::compute(pull_requests, window);
    let commits = CommitMetrics::compute(commits, window);
    let releases = ReleaseMetrics::compute(releases, window);
    let activity = ActivityMetrics::compute(&issues, &pull_requests, &commits, &releases, last_activity_at, window);

    RepositoryMetrics {
        issues,
        pull_requests,
        commits,
        releases,
        contributors: ContributorMetrics::compute(contributors),
        activity,
    }
}

/// The most recent timestamp of anything that happened in the repository.
fn last_activity(facts: &RepoFacts) -> Option<DateTime<Utc>> {
    let issues = facts.issues.iter().filter_map(|i| i.updated_at.or(i.created_at));
    let pull_requests = facts.pull_requests.iter().filter_map(|p| p.updated_at.or(p.created_at));
    let commits = facts.commits.iter().filter_map(Commit::activity_at);
    let releases = facts.releases.iter().filter_map(|r| r.published_at);

    issues
        .chain(pull_requests)
        .chain(commits)
        .chain(releases)
        .chain(facts.repository.pushed_at)
        .max()
}

/// Contributors across repositories, merged by login with their contributions summed.
/// An account is a bot if any repository reports it as one.
fn merge_contributors(facts: &[RepoFacts]) -> Vec<Contributor> {
    let mut merged: BTreeMap<&str, Contributor> = BTreeMap::new();
    for contributor in facts.iter().flat_map(|f| &f.contributors) {
        let _ = merged
            .entry(contributor.login.as_str())
            .and_modify(|m| {
                m.contributions += contributor.contributions;
                if contributor.kind == ContributorKind::Bot {
                    m.kind = ContributorKind::Bot;
                }
            })
            .or_insert_with(|| Contributor {
                url: None,
                ..contributor.clone()
            });
    }

    merged.into_values().collect()
}
