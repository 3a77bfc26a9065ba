use super::fields::Fields;
use super::{Canonical, ValidationError, actor};
use crate::facts::{EntityKind, Issue, IssueState};
use serde_json::Value;

impl Canonical for Issue {
    const KIND: EntityKind = EntityKind::Issue;

    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let number = f.u64("number").ok_or_else(|| f.missing(&["number"]))?;
        let closed_at = f.timestamp("closed_at");

        Ok(Self {
            number,
            title: f.text("title").unwrap_or_else(|| Self::KIND.untitled()),
            state: state(f.str("state"), closed_at.is_some()),
            author: actor(f.str("user.login")),
            labels: f.names("labels", "name"),
            assignees: f.names("assignees", "login"),
            comment_count: f.count("comments").unwrap_or(0),
            created_at: f.timestamp("created_at"),
            updated_at: f.timestamp("updated_at"),
            closed_at,
            url: f.string("html_url"),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        from_camel_case(value)
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        // `gh issue list --json` inlines labels and assignees as plain arrays and
        // reports comments as the array of comments; `Fields` accepts both forms.
        from_camel_case(value)
    }
}

fn from_camel_case(value: &Value) -> Result<Issue, ValidationError> {
    let f = Fields::of(Issue::KIND, value)?;
    let number = f.u64("number").ok_or_else(|| f.missing(&["number"]))?;
    let closed_at = f.timestamp("closedAt");

    Ok(Issue {
        number,
        title: f.text("title").unwrap_or_else(|| Issue::KIND.untitled()),
        state: state(f.str("state"), closed_at.is_some()),
        author: actor(f.str("author.login")),
        labels: f.names("labels", "name"),
        assignees: f.names("assignees", "login"),
        comment_count: f.count("comments").unwrap_or(0),
        created_at: f.timestamp("createdAt"),
        updated_at: f.timestamp("updatedAt"),
        closed_at,
        url: f.string("url"),
    })
}

fn state(reported: Option<&str>, has_closed_at: bool) -> IssueState {
    match reported.map(str::to_ascii_lowercase).as_deref() {
        Some("open") => IssueState::Open,
        Some("closed") => IssueState::Closed,
        _ if has_closed_at => IssueState::Closed,
        _ => IssueState::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::{SourcePayload, UNKNOWN_ACTOR, canonicalize};
    use serde_json::json;

    fn rest_issue() -> Value {
        json!({
            "number": 42,
            "title": "Crash on startup",
            "state": "closed",
            "user": { "login": "octocat" },
            "labels": [{ "name": "bug" }, { "name": "p1" }],
            "assignees": [{ "login": "hubot" }],
            "comments": 3,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-05T00:00:00Z",
            "closed_at": "2024-01-04T12:00:00Z",
            "html_url": "https://github.com/o/r/issues/42"
        })
    }

    fn graphql_issue() -> Value {
        json!({
            "number": 42,
            "title": "Crash on startup",
            "state": "CLOSED",
            "author": { "login": "octocat" },
            "labels": { "nodes": [{ "name": "bug" }, { "name": "p1" }] },
            "assignees": { "nodes": [{ "login": "hubot" }] },
            "comments": { "totalCount": 3 },
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-05T00:00:00Z",
            "closedAt": "2024-01-04T12:00:00Z",
            "url": "https://github.com/o/r/issues/42"
        })
    }

    fn cli_issue() -> Value {
        json!({
            "number": 42,
            "title": "Crash on startup",
            "state": "CLOSED",
            "author": { "login": "octocat" },
            "labels": [{ "name": "bug" }, { "name": "p1" }],
            "assignees": [{ "login": "hubot" }],
            "comments": [{ "body": "a" }, { "body": "b" }, { "body": "c" }],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-05T00:00:00Z",
            "closedAt": "2024-01-04T12:00:00Z",
            "url": "https://github.com/o/r/issues/42"
        })
    }

    #[test]
    fn test_same_issue_from_every_shape_is_identical() {
        let rest: Issue = canonicalize(&SourcePayload::Rest(rest_issue())).unwrap();
        let graphql: Issue = canonicalize(&SourcePayload::GraphQl(graphql_issue())).unwrap();
        let cli: Issue = canonicalize(&SourcePayload::Cli(cli_issue())).unwrap();

        assert_eq!(rest, graphql);
        assert_eq!(rest, cli);
        assert_eq!(rest.state, IssueState::Closed);
        assert_eq!(rest.labels, ["bug", "p1"]);
        assert_eq!(rest.comment_count, 3);
    }

    #[test]
    fn test_minimal_issue_gets_defaults() {
        let issue = Issue::from_rest(&json!({ "number": 7 })).unwrap();

        assert_eq!(issue.title, "Untitled Issue");
        assert_eq!(issue.author, UNKNOWN_ACTOR);
        assert_eq!(issue.state, IssueState::Open);
        assert!(issue.labels.is_empty());
        assert_eq!(issue.comment_count, 0);
        assert!(issue.created_at.is_none());
        assert!(issue.url.is_none());
    }

    #[test]
    fn test_missing_number_is_rejected() {
        let err = Issue::from_graphql(&json!({ "title": "no number" })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingIdentity {
                kind: EntityKind::Issue,
                fields: vec!["number"]
            }
        );
    }

    #[test]
    fn test_state_inferred_from_closed_at() {
        let issue = Issue::from_cli(&json!({ "number": 1, "closedAt": "2024-02-01T00:00:00Z" })).unwrap();
        assert_eq!(issue.state, IssueState::Closed);
    }

    #[test]
    fn test_cli_zero_timestamp_is_absent() {
        let issue = Issue::from_cli(&json!({ "number": 1, "state": "OPEN", "closedAt": "0001-01-01T00:00:00Z" })).unwrap();
        assert!(issue.closed_at.is_none());
        assert!(issue.is_open());
    }
}
