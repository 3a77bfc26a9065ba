use super::fields::Fields;
use super::{Canonical, ValidationError, actor};
use crate::facts::{EntityKind, PullRequest, PullRequestState};
use chrono::{DateTime, Utc};
use serde_json::Value;

impl Canonical for PullRequest {
    const KIND: EntityKind = EntityKind::PullRequest;

    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let number = f.u64("number").ok_or_else(|| f.missing(&["number"]))?;
        let closed_at = f.timestamp("closed_at");
        let merged_at = f.timestamp("merged_at");

        Ok(Self {
            number,
            title: f.text("title").unwrap_or_else(|| Self::KIND.untitled()),
            state: state(f.str("state"), closed_at, merged_at),
            author: actor(f.str("user.login")),
            is_draft: f.bool("draft").unwrap_or(false),
            labels: f.names("labels", "name"),
            base_branch: f.string("base.ref"),
            head_branch: f.string("head.ref"),
            additions: f.u64("additions"),
            deletions: f.u64("deletions"),
            changed_files: f.u64("changed_files"),
            review_decision: None,
            created_at: f.timestamp("created_at"),
            updated_at: f.timestamp("updated_at"),
            closed_at,
            merged_at,
            url: f.string("html_url"),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        from_camel_case(value)
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        from_camel_case(value)
    }
}

fn from_camel_case(value: &Value) -> Result<PullRequest, ValidationError> {
    let f = Fields::of(PullRequest::KIND, value)?;
    let number = f.u64("number").ok_or_else(|| f.missing(&["number"]))?;
    let closed_at = f.timestamp("closedAt");
    let merged_at = f.timestamp("mergedAt");

    Ok(PullRequest {
        number,
        title: f.text("title").unwrap_or_else(|| PullRequest::KIND.untitled()),
        state: state(f.str("state"), closed_at, merged_at),
        author: actor(f.str("author.login")),
        is_draft: f.bool("isDraft").unwrap_or(false),
        labels: f.names("labels", "name"),
        base_branch: f.string("baseRefName"),
        head_branch: f.string("headRefName"),
        additions: f.u64("additions"),
        deletions: f.u64("deletions"),
        changed_files: f.u64("changedFiles"),
        review_decision: f.text("reviewDecision"),
        created_at: f.timestamp("createdAt"),
        updated_at: f.timestamp("updatedAt"),
        closed_at,
        merged_at,
        url: f.string("url"),
    })
}

/// REST reports merged pull requests as `closed` with a `merged_at`; the camel-case shapes say `MERGED`.
fn state(reported: Option<&str>, closed_at: Option<DateTime<Utc>>, merged_at: Option<DateTime<Utc>>) -> PullRequestState {
    if merged_at.is_some() {
        return PullRequestState::Merged;
    }

    match reported.map(str::to_ascii_lowercase).as_deref() {
        Some("merged") => PullRequestState::Merged,
        Some("closed") => PullRequestState::Closed,
        Some("open") => PullRequestState::Open,
        _ if closed_at.is_some() => PullRequestState::Closed,
        _ => PullRequestState::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::{SourcePayload, UNKNOWN_ACTOR, canonicalize};
    use serde_json::json;

    #[test]
    fn test_rest_merged_pull_request() {
        let pr = PullRequest::from_rest(&json!({
            "number": 5,
            "title": "Add feature",
            "state": "closed",
            "user": { "login": "octocat" },
            "draft": false,
            "base": { "ref": "main" },
            "head": { "ref": "feature" },
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": "2024-01-03T00:00:00Z",
            "merged_at": "2024-01-03T00:00:00Z",
            "html_url": "https://github.com/o/r/pull/5"
        }))
        .unwrap();

        assert_eq!(pr.state, PullRequestState::Merged);
        assert_eq!(pr.base_branch.as_deref(), Some("main"));
        assert_eq!(pr.head_branch.as_deref(), Some("feature"));
        assert!(pr.additions.is_none());
        assert!(pr.review_decision.is_none());
    }

    #[test]
    fn test_graphql_and_cli_agree() {
        let graphql = json!({
            "number": 5,
            "title": "Add feature",
            "state": "OPEN",
            "author": { "login": "octocat" },
            "isDraft": true,
            "labels": { "nodes": [{ "name": "enhancement" }] },
            "baseRefName": "main",
            "headRefName": "feature",
            "additions": 10,
            "deletions": 2,
            "changedFiles": 1,
            "reviewDecision": "REVIEW_REQUIRED",
            "createdAt": "2024-01-01T00:00:00Z",
            "url": "https://github.com/o/r/pull/5"
        });
        let mut cli = graphql.clone();
        cli["labels"] = json!([{ "name": "enhancement" }]);

        let a: PullRequest = canonicalize(&SourcePayload::GraphQl(graphql)).unwrap();
        let b: PullRequest = canonicalize(&SourcePayload::Cli(cli)).unwrap();

        assert_eq!(a, b);
        assert!(a.is_draft);
        assert!(a.is_open());
        assert_eq!(a.additions, Some(10));
        assert_eq!(a.review_decision.as_deref(), Some("REVIEW_REQUIRED"));
    }

    #[test]
    fn test_minimal_pull_request_defaults() {
        let pr = PullRequest::from_cli(&json!({ "number": 9 })).unwrap();

        assert_eq!(pr.title, "Untitled Pull Request");
        assert_eq!(pr.author, UNKNOWN_ACTOR);
        assert_eq!(pr.state, PullRequestState::Open);
        assert!(!pr.is_draft);
    }

    #[test]
    fn test_missing_number_is_rejected() {
        let err = PullRequest::from_rest(&json!({ "title": "x" })).unwrap_err();
        assert_eq!(err.kind(), EntityKind::PullRequest);
    }

    #[test]
    fn test_closed_without_merge() {
        let pr = PullRequest::from_graphql(&json!({ "number": 2, "state": "CLOSED", "closedAt": "2024-01-03T00:00:00Z" })).unwrap();
        assert_eq!(pr.state, PullRequestState::Closed);
        assert!(!pr.is_merged());
    }
}
