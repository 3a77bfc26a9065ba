use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked project (a GitHub project board) and the repositories linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub owner: String,
    pub number: u64,
    pub title: String,
    pub is_closed: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub repositories: Vec<String>,
}

impl Project {
    /// Short human-readable reference, e.g. `octo-org#7 (Roadmap)`.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}#{} ({})", self.owner, self.number, self.title)
    }
}
