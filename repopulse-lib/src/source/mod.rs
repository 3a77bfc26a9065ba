//! Entity query sources
//!
//! An [`EntitySource`] answers paginated queries for the raw entities of a repository or
//! project owner. Every call returns a [`SourcePage`] that declares the shape its items are
//! in, the quota the source reported alongside the response, and an opaque cursor for the
//! next page. Sources never retry or sleep; that is the governor's job.
//!
//! [`GitHubSource`] talks to the GitHub REST API for repository entities and to the
//! GraphQL API for Projects (v2).

mod auth;
#[cfg(test)]
pub(crate) mod fake;
mod error;
mod github;

pub use auth::{AuthProvider, Connector, Credential, StaticToken};
pub use error::{ErrorClass, SourceError};
pub use github::{GitHubConnector, GitHubSource};

use crate::canonicalize::SourceShape;
use crate::facts::RepoSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

pub type SourceResult<T> = Result<T, SourceError>;

/// The budget a call draws from. GitHub meters REST and GraphQL requests separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuotaResource {
    /// REST requests.
    Core,
    #[serde(rename = "graphql")]
    #[strum(to_string = "graphql")]
    GraphQl,
}

impl QuotaResource {
    /// Parses the name GitHub reports in `x-ratelimit-resource`. Budgets nothing here spends (search, code scanning) yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "core" => Some(Self::Core),
            "graphql" => Some(Self::GraphQl),
            _ => None,
        }
    }
}

/// Quota information a source reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub resource: QuotaResource,
    pub remaining: u64,
    pub limit: u64,
    pub reset_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    /// The quota that will actually be available at `now`: the full limit once the reset instant has passed.
    #[must_use]
    pub fn available_at(&self, now: DateTime<Utc>) -> u64 {
        if now >= self.reset_at { self.limit.max(self.remaining) } else { self.remaining }
    }
}

/// One page of raw entities.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    pub shape: SourceShape,
    pub items: Vec<Value>,
    pub quota: Option<QuotaSnapshot>,
    pub next_cursor: Option<String>,
}

impl SourcePage {
    #[must_use]
    pub const fn new(shape: SourceShape, items: Vec<Value>) -> Self {
        Self {
            shape,
            items,
            quota: None,
            next_cursor: None,
        }
    }

    #[must_use]
    pub fn with_quota(mut self, quota: Option<QuotaSnapshot>) -> Self {
        self.quota = quota;
        self
    }

    #[must_use]
    pub fn with_next_cursor(mut self, cursor: Option<String>) -> Self {
        self.next_cursor = cursor;
        self
    }
}

/// Paginated access to raw entities.
///
/// `cursor` is `None` for the first page and otherwise the `next_cursor` of the previous page.
/// Listings that take `since` may return older entries; callers filter by their own window.
pub trait EntitySource: Send + Sync {
    fn get_repository(&self, repo: &RepoSpec) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_issues(&self, repo: &RepoSpec, since: DateTime<Utc>, cursor: Option<String>) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_pull_requests(
        &self,
        repo: &RepoSpec,
        since: DateTime<Utc>,
        cursor: Option<String>,
    ) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_commits(&self, repo: &RepoSpec, since: DateTime<Utc>, cursor: Option<String>) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_releases(&self, repo: &RepoSpec, cursor: Option<String>) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_contributors(&self, repo: &RepoSpec, cursor: Option<String>) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_projects(&self, owner: &str, cursor: Option<String>) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn list_project_items(&self, owner: &str, number: u64, cursor: Option<String>) -> impl Future<Output = SourceResult<SourcePage>> + Send;

    fn get_quota(&self) -> impl Future<Output = SourceResult<QuotaSnapshot>> + Send;
}
