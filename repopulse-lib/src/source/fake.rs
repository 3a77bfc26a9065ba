//! A scripted in-memory source for collector and pipeline tests.

use super::{EntitySource, QuotaResource, QuotaSnapshot, SourceError, SourcePage, SourceResult};
use crate::HashMap;
use crate::canonicalize::SourceShape;
use crate::facts::RepoSpec;
use chrono::{DateTime, Utc};
use core::num::ParseIntError;
use core::sync::atomic::{AtomicU64, Ordering};
use serde_json::{Value, json};

/// Raw payloads for one repository, all in one shape.
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub shape: SourceShape,
    pub repository: Value,
    pub issues: Vec<Value>,
    pub pull_requests: Vec<Value>,
    pub commits: Vec<Value>,
    pub releases: Vec<Value>,
    pub contributors: Vec<Value>,
}

impl FakeRepo {
    /// An empty REST-shaped repository named `owner/name`.
    pub fn rest(full_name: &str) -> Self {
        let (owner, name) = full_name.split_once('/').unwrap();
        Self {
            shape: SourceShape::Rest,
            repository: json!({ "owner": { "login": owner }, "name": name, "full_name": full_name }),
            issues: Vec::new(),
            pull_requests: Vec::new(),
            commits: Vec::new(),
            releases: Vec::new(),
            contributors: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeSource {
    repos: HashMap<String, FakeRepo>,
    failures: HashMap<String, SourceError>,
    projects: HashMap<String, Vec<Value>>,
    items: HashMap<(String, u64), Vec<Value>>,
    quota: Option<QuotaSnapshot>,
    graphql_quota: Option<QuotaSnapshot>,
    page_size: usize,
    calls: AtomicU64,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            page_size: 2,
            ..Self::default()
        }
    }

    pub fn with_repo(mut self, repo: FakeRepo) -> Self {
        let key = format!(
            "{}/{}",
            repo.repository["owner"]["login"].as_str().unwrap(),
            repo.repository["name"].as_str().unwrap()
        );
        let _ = self.repos.insert(key, repo);
        self
    }

    /// Every call for `repo` fails with `error`.
    pub fn failing(mut self, repo: &str, error: SourceError) -> Self {
        let _ = self.failures.insert(repo.to_string(), error);
        self
    }

    /// Adds a GraphQL-shaped project node to `owner`.
    pub fn with_project(mut self, owner: &str, project: Value) -> Self {
        self.projects.entry(owner.to_string()).or_default().push(project);
        self
    }

    pub fn with_items(mut self, owner: &str, number: u64, items: Vec<Value>) -> Self {
        let _ = self.items.insert((owner.to_string(), number), items);
        self
    }

    /// Every response reports `quota`, filed under the budget it names: REST calls report the
    /// core budget and GraphQL calls the graphql budget.
    pub const fn with_quota(mut self, quota: QuotaSnapshot) -> Self {
        match quota.resource {
            QuotaResource::Core => self.quota = Some(quota),
            QuotaResource::GraphQl => self.graphql_quota = Some(quota),
        }
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn repo(&self, repo: &RepoSpec) -> SourceResult<&FakeRepo> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let key = repo.full_name();
        if let Some(error) = self.failures.get(&key) {
            return Err(error.clone());
        }

        self.repos.get(&key).ok_or(SourceError::NotFound)
    }

    const fn quota_for(&self, shape: SourceShape) -> Option<QuotaSnapshot> {
        match shape {
            SourceShape::GraphQl => self.graphql_quota,
            _ => self.quota,
        }
    }

    fn page(&self, shape: SourceShape, all: &[Value], cursor: Option<String>) -> SourceResult<SourcePage> {
        let start: usize = cursor.map_or(Ok(0), |c| c.parse()).map_err(|e: ParseIntError| SourceError::malformed(e.to_string()))?;
        let end = (start + self.page_size).min(all.len());
        let next = (end < all.len()).then(|| end.to_string());

        Ok(SourcePage::new(shape, all.get(start..end).unwrap_or_default().to_vec())
            .with_quota(self.quota_for(shape))
            .with_next_cursor(next))
    }
}

impl EntitySource for FakeSource {
    async fn get_repository(&self, repo: &RepoSpec) -> SourceResult<SourcePage> {
        let r = self.repo(repo)?;
        Ok(SourcePage::new(r.shape, vec![r.repository.clone()]).with_quota(self.quota_for(r.shape)))
    }

    async fn list_issues(&self, repo: &RepoSpec, _since: DateTime<Utc>, cursor: Option<String>) -> SourceResult<SourcePage> {
        let r = self.repo(repo)?;
        self.page(r.shape, &r.issues, cursor)
    }

    async fn list_pull_requests(&self, repo: &RepoSpec, _since: DateTime<Utc>, cursor: Option<String>) -> SourceResult<SourcePage> {
        let r = self.repo(repo)?;
        self.page(r.shape, &r.pull_requests, cursor)
    }

    async fn list_commits(&self, repo: &RepoSpec, _since: DateTime<Utc>, cursor: Option<String>) -> SourceResult<SourcePage> {
        let r = self.repo(repo)?;
        self.page(r.shape, &r.commits, cursor)
    }

    async fn list_releases(&self, repo: &RepoSpec, cursor: Option<String>) -> SourceResult<SourcePage> {
        let r = self.repo(repo)?;
        self.page(r.shape, &r.releases, cursor)
    }

    async fn list_contributors(&self, repo: &RepoSpec, cursor: Option<String>) -> SourceResult<SourcePage> {
        let r = self.repo(repo)?;
        self.page(r.shape, &r.contributors, cursor)
    }

    async fn list_projects(&self, owner: &str, cursor: Option<String>) -> SourceResult<SourcePage> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let projects = self.projects.get(owner).ok_or(SourceError::NotFound)?;
        self.page(SourceShape::GraphQl, projects, cursor)
    }

    async fn list_project_items(&self, owner: &str, number: u64, cursor: Option<String>) -> SourceResult<SourcePage> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.get(&(owner.to_string(), number)).map_or(&[][..], Vec::as_slice);
        self.page(SourceShape::GraphQl, items, cursor)
    }

    async fn get_quota(&self) -> SourceResult<QuotaSnapshot> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quota.unwrap_or(QuotaSnapshot {
            resource: QuotaResource::Core,
            remaining: 5000,
            limit: 5000,
            reset_at: Utc::now() + chrono::Duration::hours(1),
        }))
    }
}
