use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical commit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub headline: String,
    pub message: String,
    pub author_name: String,
    pub author_login: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub committed_at: Option<DateTime<Utc>>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub url: Option<String>,
}

impl Commit {
    /// When the commit landed, falling back to the authoring time.
    #[must_use]
    pub fn activity_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at.or(self.authored_at)
    }

    /// Key used to attribute the commit to a person: the login when known, otherwise the author name.
    #[must_use]
    pub fn author_key(&self) -> &str {
        self.author_login.as_deref().unwrap_or(&self.author_name)
    }
}
