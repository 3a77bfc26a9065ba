use super::{Commit, Contributor, Issue, PullRequest, Release, RepoSpec, Repository};
use serde::{Deserialize, Serialize};

/// Every canonical fact collected for one repository during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFacts {
    pub spec: RepoSpec,
    pub repository: Repository,
    pub issues: Vec<Issue>,
    pub pull_requests: Vec<PullRequest>,
    pub commits: Vec<Commit>,
    pub releases: Vec<Release>,
    pub contributors: Vec<Contributor>,
}

impl RepoFacts {
    #[must_use]
    pub const fn new(spec: RepoSpec, repository: Repository) -> Self {
        Self {
            spec,
            repository,
            issues: Vec::new(),
            pull_requests: Vec::new(),
            commits: Vec::new(),
            releases: Vec::new(),
            contributors: Vec::new(),
        }
    }
}

/// A canonical fact tagged with the repository it belongs to.
///
/// Serializes as the fact's own fields plus a `repository` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoped<T> {
    pub repository: String,
    #[serde(flatten)]
    pub fact: T,
}

impl<T> Scoped<T> {
    pub fn new(repository: impl Into<String>, fact: T) -> Self {
        Self {
            repository: repository.into(),
            fact,
        }
    }
}
