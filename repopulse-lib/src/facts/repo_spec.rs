use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::bail;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;
use url::Url;

/// Identifies a repository as `owner/name`.
///
/// Accepts the short `owner/name` form as well as repository URLs, in which case
/// everything after the repository name (a `.git` suffix, `tree/...` paths) is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoSpec {
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepoSpec {
    pub fn new(owner: impl AsRef<str>, name: impl AsRef<str>) -> Result<Self> {
        let owner = owner.as_ref().trim();
        let name = name.as_ref().trim().trim_end_matches(".git");

        if owner.is_empty() || name.is_empty() {
            bail!("invalid repository: empty owner or repo name: '{owner}/{name}'");
        }

        if owner.contains('/') || name.contains('/') {
            bail!("invalid repository: unexpected '/' in '{owner}/{name}'");
        }

        Ok(Self {
            owner: Arc::from(owner),
            name: Arc::from(name),
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.contains("://") {
            let url = Url::parse(text).map_err(|e| ohno::app_err!("invalid repository URL '{text}': {e}"))?;
            return Self::from_url(&url);
        }

        let mut parts = text.trim().trim_matches('/').split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Self::new(owner, name),
            _ => bail!("invalid repository format, expected 'owner/name': {text}"),
        }
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();

        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        if path_segments[0].is_empty() || path_segments[1].is_empty() {
            bail!("invalid repository URL: empty owner or repo name: {url}");
        }

        Self::new(path_segments[0], path_segments[1])
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `owner/name` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSpec {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for RepoSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepoSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
