//! GitHub entity source
//!
//! Repository entities come from the REST API and are tagged [`SourceShape::Rest`];
//! projects and their items only exist in the GraphQL API and are tagged
//! [`SourceShape::GraphQl`]. REST pagination follows the `Link: rel="next"` URL,
//! GraphQL pagination follows `pageInfo.endCursor`; either way the cursor is opaque
//! to callers.

use super::{Connector, Credential, EntitySource, QuotaResource, QuotaSnapshot, SourceError, SourcePage, SourceResult};
use crate::Result;
use crate::canonicalize::SourceShape;
use crate::facts::RepoSpec;
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};
use serde_json::{Value, json};

const LOG_TARGET: &str = "    source";
const USER_AGENT: &str = "repopulse";

/// How long to back off from a rate limit that names no reset time.
const DEFAULT_RATE_LIMIT_WAIT_SECS: i64 = 60;

const PROJECTS_QUERY: &str = "
query($login: String!, $first: Int!, $after: String) {
  repositoryOwner(login: $login) {
    ... on ProjectV2Owner {
      projectsV2(first: $first, after: $after) {
        nodes {
          number
          title
          closed
          updatedAt
          url
          owner { ... on Organization { login } ... on User { login } }
          repositories(first: 100) { nodes { nameWithOwner } }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}";

const PROJECT_ITEMS_QUERY: &str = r#"
query($login: String!, $number: Int!, $first: Int!, $after: String) {
  repositoryOwner(login: $login) {
    ... on ProjectV2Owner {
      projectV2(number: $number) {
        items(first: $first, after: $after) {
          nodes {
            id
            type
            fieldValueByName(name: "Status") { ... on ProjectV2ItemFieldSingleSelectValue { name } }
            content {
              ... on Issue { title number url repository { nameWithOwner } }
              ... on PullRequest { title number url repository { nameWithOwner } }
              ... on DraftIssue { title }
            }
          }
          pageInfo { hasNextPage endCursor }
        }
      }
    }
  }
}"#;

/// A successful REST response.
struct RestResponse {
    body: Value,
    quota: Option<QuotaSnapshot>,
    next: Option<String>,
}

/// Entity source backed by the GitHub APIs.
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct GitHubSource {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl GitHubSource {
    pub fn new(credential: Option<&Credential>, base_url: impl Into<String>, page_size: u32, request_timeout: Duration) -> Result<Self> {
        let mut client_builder = reqwest::Client::builder().user_agent(USER_AGENT).timeout(request_timeout);

        if let Some(credential) = credential {
            let mut auth_val = HeaderValue::from_str(&format!("token {}", credential.token()))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);

            client_builder = client_builder.default_headers(headers);
        }

        Ok(Self {
            client: client_builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: page_size.clamp(1, 100),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn repo_url(&self, repo: &RepoSpec, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.base_url, repo.owner(), repo.name())
    }

    /// `empty_on_conflict` turns a 409 into an empty listing; GitHub answers 409 for the
    /// commits of an empty repository.
    async fn rest_get(&self, url: &str, empty_on_conflict: bool) -> SourceResult<RestResponse> {
        log::debug!(target: LOG_TARGET, "GET {url}");

        let resp = self
            .client
            .get(url)
            .header("accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let headers = resp.headers();
        let quota = quota_from_headers(headers, QuotaResource::Core);
        let next = next_link(headers);

        if empty_on_conflict && resp.status() == StatusCode::CONFLICT {
            log::debug!(target: LOG_TARGET, "GET {url} reported a conflict, treating as empty");
            return Ok(RestResponse {
                body: Value::Array(Vec::new()),
                quota,
                next: None,
            });
        }

        if let Some(error) = classify_status(resp.status(), quota, retry_after_secs(headers), Utc::now()) {
            log::debug!(target: LOG_TARGET, "GET {url} failed: {error}");
            return Err(error);
        }

        let body = resp.json::<Value>().await.map_err(|e| SourceError::malformed(e.to_string()))?;
        Ok(RestResponse { body, quota, next })
    }

    /// Fetches one page of a REST listing, whose body must be a JSON array.
    async fn rest_list(&self, url: &str, empty_on_conflict: bool) -> SourceResult<SourcePage> {
        let resp = self.rest_get(url, empty_on_conflict).await?;
        let Value::Array(items) = resp.body else {
            return Err(SourceError::malformed(format!("expected a JSON array from {url}")));
        };

        Ok(SourcePage::new(SourceShape::Rest, items)
            .with_quota(resp.quota)
            .with_next_cursor(resp.next))
    }

    async fn graphql(&self, query: &str, variables: Value) -> SourceResult<(Value, Option<QuotaSnapshot>)> {
        let url = format!("{}/graphql", self.base_url);
        log::debug!(target: LOG_TARGET, "POST {url} {variables}");

        let resp = self
            .client
            .post(&url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let headers = resp.headers();
        let quota = quota_from_headers(headers, QuotaResource::GraphQl);
        let now = Utc::now();

        if let Some(error) = classify_status(resp.status(), quota, retry_after_secs(headers), now) {
            log::debug!(target: LOG_TARGET, "POST {url} failed: {error}");
            return Err(error);
        }

        let body = resp.json::<Value>().await.map_err(|e| SourceError::malformed(e.to_string()))?;
        if let Some(error) = graphql_error(&body, quota, now) {
            log::debug!(target: LOG_TARGET, "GraphQL query failed: {error}");
            return Err(error);
        }

        match body.get("data") {
            Some(data) if !data.is_null() => Ok((data.clone(), quota)),
            _ => Err(SourceError::malformed("GraphQL response carries no data")),
        }
    }
}

impl EntitySource for GitHubSource {
    async fn get_repository(&self, repo: &RepoSpec) -> SourceResult<SourcePage> {
        let resp = self.rest_get(&self.repo_url(repo, ""), false).await?;
        if !resp.body.is_object() {
            return Err(SourceError::malformed(format!("expected a repository object for '{repo}'")));
        }

        Ok(SourcePage::new(SourceShape::Rest, vec![resp.body]).with_quota(resp.quota))
    }

    async fn list_issues(&self, repo: &RepoSpec, since: DateTime<Utc>, cursor: Option<String>) -> SourceResult<SourcePage> {
        let url = cursor.unwrap_or_else(|| {
            self.repo_url(
                repo,
                &format!("/issues?state=all&since={}&per_page={}", rfc3339(since), self.page_size),
            )
        });

        // The issues endpoint also returns pull requests, marked by a `pull_request` member.
        let mut page = self.rest_list(&url, false).await?;
        page.items.retain(|item| item.get("pull_request").is_none());
        Ok(page)
    }

    async fn list_pull_requests(&self, repo: &RepoSpec, since: DateTime<Utc>, cursor: Option<String>) -> SourceResult<SourcePage> {
        let url = cursor.unwrap_or_else(|| {
            self.repo_url(
                repo,
                &format!("/pulls?state=all&sort=updated&direction=desc&per_page={}", self.page_size),
            )
        });

        let mut page = self.rest_list(&url, false).await?;
        if truncate_before(&mut page.items, "updated_at", since) {
            page.next_cursor = None;
        }

        Ok(page)
    }

    async fn list_commits(&self, repo: &RepoSpec, since: DateTime<Utc>, cursor: Option<String>) -> SourceResult<SourcePage> {
        let url = cursor.unwrap_or_else(|| self.repo_url(repo, &format!("/commits?since={}&per_page={}", rfc3339(since), self.page_size)));

        self.rest_list(&url, true).await
    }

    async fn list_releases(&self, repo: &RepoSpec, cursor: Option<String>) -> SourceResult<SourcePage> {
        let url = cursor.unwrap_or_else(|| self.repo_url(repo, &format!("/releases?per_page={}", self.page_size)));
        self.rest_list(&url, false).await
    }

    async fn list_contributors(&self, repo: &RepoSpec, cursor: Option<String>) -> SourceResult<SourcePage> {
        let url = cursor.unwrap_or_else(|| self.repo_url(repo, &format!("/contributors?per_page={}", self.page_size)));
        self.rest_list(&url, false).await
    }

    async fn list_projects(&self, owner: &str, cursor: Option<String>) -> SourceResult<SourcePage> {
        let variables = json!({ "login": owner, "first": self.page_size, "after": cursor });
        let (data, quota) = self.graphql(PROJECTS_QUERY, variables).await?;
        connection_page(&data, &["repositoryOwner", "projectsV2"], quota)
    }

    async fn list_project_items(&self, owner: &str, number: u64, cursor: Option<String>) -> SourceResult<SourcePage> {
        let variables = json!({ "login": owner, "number": number, "first": self.page_size, "after": cursor });
        let (data, quota) = self.graphql(PROJECT_ITEMS_QUERY, variables).await?;
        connection_page(&data, &["repositoryOwner", "projectV2", "items"], quota)
    }

    async fn get_quota(&self) -> SourceResult<QuotaSnapshot> {
        let resp = self.rest_get(&format!("{}/rate_limit", self.base_url), false).await?;
        let core = resp
            .body
            .pointer("/resources/core")
            .ok_or_else(|| SourceError::malformed("rate limit response lacks resources.core"))?;

        let field = |name: &str| core.get(name).and_then(Value::as_u64);
        match (field("remaining"), field("limit"), field("reset").and_then(|r| i64::try_from(r).ok())) {
            (Some(remaining), Some(limit), Some(reset)) => {
                let reset_at = DateTime::from_timestamp(reset, 0).ok_or_else(|| SourceError::malformed("invalid reset timestamp"))?;
                Ok(QuotaSnapshot {
                    resource: QuotaResource::Core,
                    remaining,
                    limit,
                    reset_at,
                })
            }
            _ => resp
                .quota
                .filter(|q| q.resource == QuotaResource::Core)
                .ok_or_else(|| SourceError::malformed("rate limit response lacks quota fields")),
        }
    }
}

/// Connects [`GitHubSource`] instances for a fixed endpoint and page size.
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    api_url: String,
    page_size: u32,
    request_timeout: Duration,
}

impl GitHubConnector {
    pub fn new(api_url: impl Into<String>, page_size: u32, request_timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            page_size,
            request_timeout,
        }
    }
}

impl Connector for GitHubConnector {
    type Source = GitHubSource;

    fn connect(&self, credential: &Credential) -> Result<GitHubSource> {
        GitHubSource::new(Some(credential), self.api_url.clone(), self.page_size, self.request_timeout)
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn transport_error(e: &reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::network(e.to_string())
    }
}

/// Maps a non-success HTTP status to a source error.
fn classify_status(status: StatusCode, quota: Option<QuotaSnapshot>, retry_after: Option<i64>, now: DateTime<Utc>) -> Option<SourceError> {
    if status.is_success() {
        return None;
    }

    let quota_exhausted = quota.filter(|q| q.remaining == 0);
    let error = match status {
        StatusCode::UNAUTHORIZED => SourceError::Unauthorized,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if quota_exhausted.is_some() || retry_after.is_some() || status == StatusCode::TOO_MANY_REQUESTS => {
            let reset_at = quota_exhausted
                .map(|q| q.reset_at)
                .or_else(|| retry_after.map(|secs| now + chrono::Duration::seconds(secs)))
                .unwrap_or_else(|| now + chrono::Duration::seconds(DEFAULT_RATE_LIMIT_WAIT_SECS));
            SourceError::RateLimited { reset_at }
        }
        StatusCode::FORBIDDEN => SourceError::Forbidden,
        StatusCode::NOT_FOUND => SourceError::NotFound,
        s if s.is_server_error() => SourceError::Server { status: s.as_u16() },
        s => SourceError::malformed(format!("unexpected HTTP status {}", s.as_u16())),
    };

    Some(error)
}

/// Maps the `errors` member of a GraphQL response to a source error.
fn graphql_error(body: &Value, quota: Option<QuotaSnapshot>, now: DateTime<Utc>) -> Option<SourceError> {
    let first = body.get("errors")?.as_array()?.first()?;
    let message = first.get("message").and_then(Value::as_str).unwrap_or("unknown GraphQL error");

    let error = match first.get("type").and_then(Value::as_str) {
        Some("NOT_FOUND") => SourceError::NotFound,
        Some("FORBIDDEN" | "INSUFFICIENT_SCOPES") => SourceError::Forbidden,
        Some("RATE_LIMITED") => SourceError::RateLimited {
            reset_at: quota
                .map(|q| q.reset_at)
                .unwrap_or_else(|| now + chrono::Duration::seconds(DEFAULT_RATE_LIMIT_WAIT_SECS)),
        },
        _ => SourceError::malformed(message),
    };

    Some(error)
}

/// Extracts one page of a GraphQL connection found at `path` below `data`.
fn connection_page(data: &Value, path: &[&str], quota: Option<QuotaSnapshot>) -> SourceResult<SourcePage> {
    let mut connection = data;
    for segment in path {
        connection = connection.get(segment).filter(|v| !v.is_null()).ok_or(SourceError::NotFound)?;
    }

    let nodes = connection
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::malformed(format!("connection '{}' has no nodes", path.join("."))))?;

    let has_next = connection.pointer("/pageInfo/hasNextPage").and_then(Value::as_bool).unwrap_or(false);
    let next_cursor = connection
        .pointer("/pageInfo/endCursor")
        .and_then(Value::as_str)
        .filter(|_| has_next)
        .map(str::to_string);

    let items = nodes.iter().filter(|n| !n.is_null()).cloned().collect();
    Ok(SourcePage::new(SourceShape::GraphQl, items)
        .with_quota(quota)
        .with_next_cursor(next_cursor))
}

/// Drops every item from the first one whose `field` timestamp is older than `since`.
/// Returns whether anything was dropped.
fn truncate_before(items: &mut Vec<Value>, field: &str, since: DateTime<Utc>) -> bool {
    let cutoff = items.iter().position(|item| {
        item.get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .is_some_and(|ts| ts.with_timezone(&Utc) < since)
    });

    match cutoff {
        Some(idx) => {
            items.truncate(idx);
            true
        }
        None => false,
    }
}

/// Extract rate limit information from API response headers
///
/// The budget is the one `x-ratelimit-resource` names, or `fallback` when the header is absent.
fn quota_from_headers(headers: &HeaderMap, fallback: QuotaResource) -> Option<QuotaSnapshot> {
    let header = |name: &str| headers.get(name)?.to_str().ok()?.trim().parse::<u64>().ok();

    let resource = match headers.get("x-ratelimit-resource") {
        Some(value) => QuotaResource::from_name(value.to_str().ok()?)?,
        None => fallback,
    };
    let remaining = header("x-ratelimit-remaining")?;
    let limit = header("x-ratelimit-limit").unwrap_or(remaining);
    let reset_at = DateTime::from_timestamp(i64::try_from(header("x-ratelimit-reset")?).ok()?, 0)?;

    Some(QuotaSnapshot {
        resource,
        remaining,
        limit,
        reset_at,
    })
}

fn retry_after_secs(headers: &HeaderMap) -> Option<i64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

/// The URL of the `rel="next"` entry of a `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn test_quota_from_headers() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
        let _ = headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        let quota = quota_from_headers(&headers, QuotaResource::Core).unwrap();

        assert_eq!(quota.resource, QuotaResource::Core);
        assert_eq!(quota.remaining, 4999);
        assert_eq!(quota.limit, 5000);
        assert_eq!(quota.reset_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_quota_resource_header_selects_budget() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("3"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));
        assert_eq!(quota_from_headers(&headers, QuotaResource::Core).unwrap().resource, QuotaResource::Core);

        let _ = headers.insert("x-ratelimit-resource", HeaderValue::from_static("graphql"));
        assert_eq!(quota_from_headers(&headers, QuotaResource::Core).unwrap().resource, QuotaResource::GraphQl);

        let _ = headers.insert("x-ratelimit-resource", HeaderValue::from_static("search"));
        assert!(quota_from_headers(&headers, QuotaResource::Core).is_none());
    }

    #[test]
    fn test_quota_missing_or_invalid_headers() {
        assert!(quota_from_headers(&HeaderMap::new(), QuotaResource::Core).is_none());

        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("invalid"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));
        assert!(quota_from_headers(&headers, QuotaResource::Core).is_none());
    }

    #[test]
    fn test_next_link() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.github.com/repositories/1/issues?page=2>; rel="next", <https://api.github.com/repositories/1/issues?page=5>; rel="last""#,
            ),
        );

        assert_eq!(next_link(&headers).as_deref(), Some("https://api.github.com/repositories/1/issues?page=2"));
    }

    #[test]
    fn test_next_link_absent_on_last_page() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(LINK, HeaderValue::from_static(r#"<https://api.github.com/x?page=1>; rel="first""#));
        assert!(next_link(&headers).is_none());
    }

    #[test]
    fn test_classify_status() {
        let now = at(1_000);
        let exhausted = Some(QuotaSnapshot {
            resource: QuotaResource::Core,
            remaining: 0,
            limit: 5000,
            reset_at: at(4_600),
        });

        assert_eq!(classify_status(StatusCode::OK, None, None, now), None);
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED, None, None, now), Some(SourceError::Unauthorized));
        assert_eq!(classify_status(StatusCode::FORBIDDEN, None, None, now), Some(SourceError::Forbidden));
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, exhausted, None, now),
            Some(SourceError::RateLimited { reset_at: at(4_600) })
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, None, Some(30), now),
            Some(SourceError::RateLimited { reset_at: at(1_030) })
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, None, None, now),
            Some(SourceError::RateLimited { reset_at: at(1_060) })
        );
        assert_eq!(classify_status(StatusCode::NOT_FOUND, None, None, now), Some(SourceError::NotFound));
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY, None, None, now), Some(SourceError::Server { status: 502 }));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, None, None, now),
            Some(SourceError::Malformed { .. })
        ));
    }

    #[test]
    fn test_graphql_errors() {
        let now = at(1_000);
        let not_found = json!({ "data": { "repositoryOwner": null }, "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve" }] });
        let other = json!({ "errors": [{ "message": "Field 'x' doesn't exist" }] });

        assert_eq!(graphql_error(&not_found, None, now), Some(SourceError::NotFound));
        assert_eq!(graphql_error(&other, None, now), Some(SourceError::malformed("Field 'x' doesn't exist")));
        assert_eq!(graphql_error(&json!({ "data": {} }), None, now), None);
    }

    #[test]
    fn test_connection_page() {
        let data = json!({
            "repositoryOwner": {
                "projectsV2": {
                    "nodes": [{ "number": 1 }, null, { "number": 2 }],
                    "pageInfo": { "hasNextPage": true, "endCursor": "Y3Vyc29y" }
                }
            }
        });

        let page = connection_page(&data, &["repositoryOwner", "projectsV2"], None).unwrap();

        assert_eq!(page.shape, SourceShape::GraphQl);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("Y3Vyc29y"));
    }

    #[test]
    fn test_connection_page_missing_owner_is_not_found() {
        let data = json!({ "repositoryOwner": null });
        assert_eq!(
            connection_page(&data, &["repositoryOwner", "projectsV2"], None).unwrap_err(),
            SourceError::NotFound
        );
    }

    #[test]
    fn test_truncate_before() {
        let mut items = vec![
            json!({ "number": 3, "updated_at": "2024-03-01T00:00:00Z" }),
            json!({ "number": 2, "updated_at": "2024-02-01T00:00:00Z" }),
            json!({ "number": 1, "updated_at": "2023-12-01T00:00:00Z" }),
        ];

        let since = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        assert!(truncate_before(&mut items, "updated_at", since));
        assert_eq!(items.len(), 2);
        assert!(!truncate_before(&mut items, "updated_at", since));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    fn test_source_new_normalizes_base_url() {
        let credential = Credential::new("test_token").unwrap();
        let source = GitHubSource::new(Some(&credential), "https://api.github.com/", 500, Duration::from_secs(5)).unwrap();

        assert_eq!(source.base_url(), "https://api.github.com");
        assert_eq!(source.page_size, 100);
    }
}
