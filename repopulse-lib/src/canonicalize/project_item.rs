use super::fields::Fields;
use super::{Canonical, ValidationError};
use crate::facts::{EntityKind, ProjectItem, ProjectItemType};
use serde_json::Value;

impl Canonical for ProjectItem {
    const KIND: EntityKind = EntityKind::ProjectItem;

    /// Classic project cards. The linked content is only known through its API URL.
    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let id = f
            .u64("id")
            .map(|id| id.to_string())
            .or_else(|| f.text("id"))
            .ok_or_else(|| f.missing(&["id"]))?;

        let content = f.str("content_url").and_then(parse_content_url);
        let (content_type, repository, number) = match content {
            Some((kind, repo, number)) => (kind, Some(repo), Some(number)),
            None if f.text("note").is_some() => (ProjectItemType::DraftIssue, None, None),
            None => (ProjectItemType::Unknown, None, None),
        };

        Ok(Self {
            id,
            content_type,
            title: f.text("note").unwrap_or_else(|| Self::KIND.untitled()),
            repository,
            number,
            status: f.text("column_name"),
            url: f.string("html_url"),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let id = f.text("id").ok_or_else(|| f.missing(&["id"]))?;

        Ok(Self {
            id,
            content_type: f.str("type").map_or(ProjectItemType::Unknown, ProjectItemType::parse),
            title: f.text("content.title").unwrap_or_else(|| Self::KIND.untitled()),
            repository: f.text("content.repository.nameWithOwner"),
            number: f.u64("content.number"),
            status: f.text("fieldValueByName.name"),
            url: f.string("content.url"),
        })
    }

    /// `gh project item-list --format json` items.
    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let id = f.text("id").ok_or_else(|| f.missing(&["id"]))?;
        let content_type = f
            .str("content.type")
            .or_else(|| f.str("type"))
            .map_or(ProjectItemType::Unknown, ProjectItemType::parse);

        Ok(Self {
            id,
            content_type,
            title: f
                .text("title")
                .or_else(|| f.text("content.title"))
                .unwrap_or_else(|| Self::KIND.untitled()),
            repository: f.text("content.repository").or_else(|| f.text("repository")),
            number: f.u64("content.number"),
            status: f.text("status"),
            url: f.string("content.url"),
        })
    }
}

/// Splits `https://api.github.com/repos/{owner}/{repo}/{issues|pulls}/{number}`.
fn parse_content_url(url: &str) -> Option<(ProjectItemType, String, u64)> {
    let (_, path) = url.split_once("/repos/")?;
    let mut segments = path.trim_end_matches('/').split('/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let name = segments.next().filter(|s| !s.is_empty())?;
    let kind = match segments.next()? {
        "issues" => ProjectItemType::Issue,
        "pulls" => ProjectItemType::PullRequest,
        _ => return None,
    };
    let number = segments.next()?.parse().ok()?;

    Some((kind, format!("{owner}/{name}"), number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graphql_item() {
        let item = ProjectItem::from_graphql(&json!({
            "id": "PVTI_1",
            "type": "PULL_REQUEST",
            "content": {
                "title": "Add caching",
                "number": 12,
                "url": "https://github.com/octo-org/api/pull/12",
                "repository": { "nameWithOwner": "octo-org/api" }
            },
            "fieldValueByName": { "name": "In Progress" }
        }))
        .unwrap();

        assert_eq!(item.content_type, ProjectItemType::PullRequest);
        assert_eq!(item.repository.as_deref(), Some("octo-org/api"));
        assert_eq!(item.number, Some(12));
        assert_eq!(item.status.as_deref(), Some("In Progress"));
    }

    #[test]
    fn test_cli_item_matches_graphql() {
        let cli = ProjectItem::from_cli(&json!({
            "id": "PVTI_1",
            "title": "Add caching",
            "status": "In Progress",
            "content": {
                "type": "PullRequest",
                "number": 12,
                "repository": "octo-org/api",
                "title": "Add caching",
                "url": "https://github.com/octo-org/api/pull/12"
            }
        }))
        .unwrap();
        let graphql = ProjectItem::from_graphql(&json!({
            "id": "PVTI_1",
            "type": "PULL_REQUEST",
            "content": {
                "title": "Add caching",
                "number": 12,
                "url": "https://github.com/octo-org/api/pull/12",
                "repository": { "nameWithOwner": "octo-org/api" }
            },
            "fieldValueByName": { "name": "In Progress" }
        }))
        .unwrap();

        assert_eq!(cli, graphql);
    }

    #[test]
    fn test_rest_card_with_linked_issue() {
        let item = ProjectItem::from_rest(&json!({
            "id": 1478,
            "note": null,
            "column_name": "To do",
            "content_url": "https://api.github.com/repos/octo-org/api/issues/3"
        }))
        .unwrap();

        assert_eq!(item.id, "1478");
        assert_eq!(item.content_type, ProjectItemType::Issue);
        assert_eq!(item.repository.as_deref(), Some("octo-org/api"));
        assert_eq!(item.number, Some(3));
        assert_eq!(item.title, "Untitled Item");
    }

    #[test]
    fn test_rest_note_card_is_a_draft() {
        let item = ProjectItem::from_rest(&json!({ "id": 9, "note": "Remember to ship" })).unwrap();

        assert_eq!(item.content_type, ProjectItemType::DraftIssue);
        assert_eq!(item.title, "Remember to ship");
        assert!(item.repository.is_none());
    }

    #[test]
    fn test_draft_item_without_content() {
        let item = ProjectItem::from_graphql(&json!({ "id": "PVTI_2", "type": "DRAFT_ISSUE" })).unwrap();

        assert_eq!(item.content_type, ProjectItemType::DraftIssue);
        assert_eq!(item.title, "Untitled Item");
        assert!(item.repository.is_none());
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let err = ProjectItem::from_cli(&json!({ "title": "x" })).unwrap_err();
        assert_eq!(err.kind(), EntityKind::ProjectItem);
    }

    #[test]
    fn test_parse_content_url_rejects_other_paths() {
        assert!(parse_content_url("https://api.github.com/repos/o/r/commits/abc").is_none());
        assert!(parse_content_url("https://example.com/o/r/issues/1").is_none());
    }
}
