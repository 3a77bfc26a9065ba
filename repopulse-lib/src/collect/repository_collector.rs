use super::paginate::paginate;
use super::{CollectOptions, RepoFailure, RepoFailureCause};
use crate::canonicalize::canonicalize;
use crate::facts::{ActivityWindow, RepoFacts, RepoSpec, Repository};
use crate::governor::RateGovernor;
use crate::source::{EntitySource, QuotaResource};
use std::sync::Arc;

const LOG_TARGET: &str = "   collect";

/// Fetches and canonicalizes every entity kind of one repository.
#[derive(Debug)]
pub struct RepositoryCollector<S> {
    source: Arc<S>,
    governor: Arc<RateGovernor>,
    options: CollectOptions,
}

impl<S: EntitySource> RepositoryCollector<S> {
    #[must_use]
    pub const fn new(source: Arc<S>, governor: Arc<RateGovernor>, options: CollectOptions) -> Self {
        Self { source, governor, options }
    }

    #[must_use]
    pub const fn options(&self) -> &CollectOptions {
        &self.options
    }

    /// Collects `repo`, reaching back to the start of the window preceding `window` so growth
    /// can be measured. Any failure is returned as a value naming the repository.
    pub async fn collect(&self, repo: &RepoSpec, window: &ActivityWindow) -> Result<RepoFacts, RepoFailure> {
        match self.collect_facts(repo, window).await {
            Ok(facts) => {
                log::info!(
                    target: LOG_TARGET,
                    "Collected '{repo}': {} issue(s), {} pull request(s), {} commit(s), {} release(s), {} contributor(s)",
                    facts.issues.len(),
                    facts.pull_requests.len(),
                    facts.commits.len(),
                    facts.releases.len(),
                    facts.contributors.len()
                );
                Ok(facts)
            }
            Err(cause) => {
                log::warn!(target: LOG_TARGET, "Could not collect repository '{repo}': {cause}");
                Err(RepoFailure::new(repo.clone(), cause))
            }
        }
    }

    async fn collect_facts(&self, repo: &RepoSpec, window: &ActivityWindow) -> Result<RepoFacts, RepoFailureCause> {
        log::debug!(target: LOG_TARGET, "Querying repository '{repo}'");

        let source = &*self.source;
        let since = window.collection_start();
        let limits = &self.options.limits;
        let scope = repo.full_name();

        let page = self.governor.call("repository lookup", QuotaResource::Core, || source.get_repository(repo)).await?;
        let raw = page.items.into_iter().next().ok_or_else(|| RepoFailureCause::Malformed {
            message: format!("no repository payload returned for '{repo}'"),
        })?;
        let repository: Repository = canonicalize(&page.shape.wrap(raw))?;

        let mut facts = RepoFacts::new(repo.clone(), repository);
        facts.issues = paginate(&self.governor, QuotaResource::Core, &scope, limits.issues, |cursor| source.list_issues(repo, since, cursor)).await?;
        facts.pull_requests = paginate(&self.governor, QuotaResource::Core, &scope, limits.pull_requests, |cursor| {
            source.list_pull_requests(repo, since, cursor)
        })
        .await?;
        facts.commits = paginate(&self.governor, QuotaResource::Core, &scope, limits.commits, |cursor| source.list_commits(repo, since, cursor)).await?;
        facts.releases = paginate(&self.governor, QuotaResource::Core, &scope, limits.releases, |cursor| source.list_releases(repo, cursor)).await?;
        facts.contributors = paginate(&self.governor, QuotaResource::Core, &scope, limits.contributors, |cursor| source.list_contributors(repo, cursor)).await?;

        Ok(facts)
    }
}
