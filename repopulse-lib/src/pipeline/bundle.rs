use super::RunLogEntry;
use crate::aggregate::AggregateMetrics;
use crate::collect::RepoFailure;
use crate::facts::{ActivityWindow, Commit, Contributor, Issue, Project, ProjectItem, PullRequest, Release, RepoFacts, Repository, Scoped};
use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Complete,
    /// Some repositories could not be collected.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub state: RunState,
    pub failed_repositories: Vec<RepoFailure>,
}

impl RunStatus {
    #[must_use]
    pub fn from_failures(failed_repositories: Vec<RepoFailure>) -> Self {
        let state = if failed_repositories.is_empty() {
            RunState::Complete
        } else {
            RunState::Degraded
        };

        Self { state, failed_repositories }
    }
}

/// Every canonical entity of a run, ordered by repository and then identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Entities {
    pub repositories: Vec<Repository>,
    pub issues: Vec<Scoped<Issue>>,
    pub pull_requests: Vec<Scoped<PullRequest>>,
    pub commits: Vec<Scoped<Commit>>,
    pub releases: Vec<Scoped<Release>>,
    pub contributors: Vec<Scoped<Contributor>>,
    pub project_items: Vec<ProjectItem>,
}

impl Entities {
    /// Flattens per-repository facts, which must already be sorted by repository.
    #[must_use]
    pub fn from_facts(facts: Vec<RepoFacts>, project_items: Vec<ProjectItem>) -> Self {
        let mut entities = Self {
            project_items,
            ..Self::default()
        };

        for repo in facts {
            let name = repo.spec.full_name();
            entities.issues.extend(repo.issues.into_iter().map(|f| Scoped::new(name.clone(), f)));
            entities.pull_requests.extend(repo.pull_requests.into_iter().map(|f| Scoped::new(name.clone(), f)));
            entities.commits.extend(repo.commits.into_iter().map(|f| Scoped::new(name.clone(), f)));
            entities.releases.extend(repo.releases.into_iter().map(|f| Scoped::new(name.clone(), f)));
            entities.contributors.extend(repo.contributors.into_iter().map(|f| Scoped::new(name.clone(), f)));
            entities.repositories.push(repo.repository);
        }

        entities
    }
}

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputBundle {
    pub project: Project,
    pub window: ActivityWindow,
    pub status: RunStatus,
    pub entities: Entities,
    pub aggregates: AggregateMetrics,
    pub run_log: Vec<RunLogEntry>,
}
