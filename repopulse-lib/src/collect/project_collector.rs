use super::{CollectionOutcome, RepoFailure, RepoFailureCause, RepositoryCollector};
use crate::facts::{ActivityWindow, RepoSpec};
use crate::governor::Throttler;
use crate::source::EntitySource;
use std::collections::BTreeSet;
use std::sync::Arc;

const LOG_TARGET: &str = "   collect";

/// Cancels a running collection: repositories that have not started yet fail with
/// [`RepoFailureCause::Cancelled`], repositories in flight complete normally.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    throttler: Arc<Throttler>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        log::info!(target: LOG_TARGET, "Cancelling collection");
        self.throttler.close();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.throttler.is_closed()
    }
}

/// Collects many repositories concurrently, with a bounded number in flight.
///
/// A failing repository never affects the others; its failure becomes part of the outcome.
#[derive(Debug)]
pub struct ProjectCollector<S> {
    collector: RepositoryCollector<S>,
    throttler: Arc<Throttler>,
}

impl<S: EntitySource> ProjectCollector<S> {
    #[must_use]
    pub fn new(collector: RepositoryCollector<S>, concurrency: usize) -> Self {
        Self {
            collector,
            throttler: Throttler::new(concurrency),
        }
    }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            throttler: Arc::clone(&self.throttler),
        }
    }

    /// Collects every repository once; duplicates in the input are ignored.
    pub async fn collect(&self, repositories: impl IntoIterator<Item = RepoSpec>, window: &ActivityWindow) -> CollectionOutcome {
        let repositories: BTreeSet<RepoSpec> = repositories.into_iter().collect();
        log::info!(target: LOG_TARGET, "Collecting {} repositories", repositories.len());

        let fetches = repositories.into_iter().map(|repo| async move {
            let Some(_permit) = self.throttler.acquire().await else {
                log::debug!(target: LOG_TARGET, "Not starting '{repo}': collection was cancelled");
                return Err(RepoFailure::new(repo, RepoFailureCause::Cancelled));
            };

            self.collector.collect(&repo, window).await
        });

        let outcome = CollectionOutcome::from_results(futures_util::future::join_all(fetches).await);
        log::info!(
            target: LOG_TARGET,
            "Collection {}: {} succeeded, {} failed",
            outcome.status,
            outcome.successes.len(),
            outcome.failures.len()
        );

        outcome
    }
}
