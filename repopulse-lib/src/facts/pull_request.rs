use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical pull request record.
///
/// `additions`, `deletions`, `changed_files` and `review_decision` are `None` when the
/// source shape does not report them (REST listings never do).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: PullRequestState,
    pub author: String,
    pub is_draft: bool,
    pub labels: Vec<String>,
    pub base_branch: Option<String>,
    pub head_branch: Option<String>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub changed_files: Option<u64>,
    pub review_decision: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Pull request state. A merged pull request is also closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl PullRequest {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == PullRequestState::Open
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Merged
    }
}
