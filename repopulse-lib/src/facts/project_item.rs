use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: String,
    pub content_type: ProjectItemType,
    pub title: String,
    /// Repository of the linked issue or pull request, as `owner/name`.
    pub repository: Option<String>,
    pub number: Option<u64>,
    pub status: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectItemType {
    Issue,
    PullRequest,
    DraftIssue,
    Unknown,
}

impl ProjectItemType {
    /// Parses the content type names used by the different sources
    /// (`ISSUE`, `PullRequest`, `draft_issue`, ...).
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let normalized: String = text.chars().filter(|c| *c != '_').collect::<String>().to_ascii_lowercase();
        match normalized.as_str() {
            "issue" => Self::Issue,
            "pullrequest" => Self::PullRequest,
            "draftissue" => Self::DraftIssue,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_types() {
        assert_eq!(ProjectItemType::parse("ISSUE"), ProjectItemType::Issue);
        assert_eq!(ProjectItemType::parse("PULL_REQUEST"), ProjectItemType::PullRequest);
        assert_eq!(ProjectItemType::parse("PullRequest"), ProjectItemType::PullRequest);
        assert_eq!(ProjectItemType::parse("DRAFT_ISSUE"), ProjectItemType::DraftIssue);
        assert_eq!(ProjectItemType::parse("Epic"), ProjectItemType::Unknown);
    }

    #[test]
    fn test_display_is_snake_case() {
        assert_eq!(ProjectItemType::PullRequest.to_string(), "pull_request");
    }
}
