use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical repository record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    pub is_archived: bool,
    pub is_fork: bool,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub primary_language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl Repository {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
