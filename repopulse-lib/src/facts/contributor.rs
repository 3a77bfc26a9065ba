use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
    pub kind: ContributorKind,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorKind {
    User,
    Bot,
}

impl ContributorKind {
    /// Classifies an account from its reported type, falling back to GitHub's `[bot]` login suffix.
    #[must_use]
    pub fn classify(reported_type: Option<&str>, login: &str) -> Self {
        match reported_type {
            Some(t) if t.eq_ignore_ascii_case("bot") => Self::Bot,
            Some(_) => Self::User,
            None if login.ends_with("[bot]") => Self::Bot,
            None => Self::User,
        }
    }
}
