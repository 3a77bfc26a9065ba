use crate::facts::EntityKind;
use serde::{Deserialize, Serialize};

/// Maximum number of entities collected per repository (or per project, for items).
///
/// A limit of zero skips the entity kind entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityLimits {
    pub issues: u32,
    pub pull_requests: u32,
    pub commits: u32,
    pub releases: u32,
    pub contributors: u32,
    pub project_items: u32,
}

impl Default for EntityLimits {
    fn default() -> Self {
        Self {
            issues: 500,
            pull_requests: 500,
            commits: 1000,
            releases: 100,
            contributors: 100,
            project_items: 500,
        }
    }
}

impl EntityLimits {
    /// The limits of the entity kinds collected for every repository.
    #[must_use]
    pub const fn per_repository(&self) -> [(EntityKind, u32); 5] {
        [
            (EntityKind::Issue, self.issues),
            (EntityKind::PullRequest, self.pull_requests),
            (EntityKind::Commit, self.commits),
            (EntityKind::Release, self.releases),
            (EntityKind::Contributor, self.contributors),
        ]
    }
}

/// Settings shared by every repository collection of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub limits: EntityLimits,
    pub page_size: u32,
}

impl CollectOptions {
    #[must_use]
    pub const fn new(limits: EntityLimits, page_size: u32) -> Self {
        Self { limits, page_size }
    }

    /// Number of pages needed to reach `limit` items.
    #[must_use]
    pub fn pages_for(&self, limit: u32) -> u64 {
        u64::from(limit.div_ceil(self.page_size.max(1)))
    }
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self::new(EntityLimits::default(), 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_for_rounds_up() {
        let options = CollectOptions::new(EntityLimits::default(), 100);

        assert_eq!(options.pages_for(0), 0);
        assert_eq!(options.pages_for(1), 1);
        assert_eq!(options.pages_for(100), 1);
        assert_eq!(options.pages_for(101), 2);
    }

    #[test]
    fn test_zero_page_size_does_not_divide_by_zero() {
        let options = CollectOptions::new(EntityLimits::default(), 0);
        assert_eq!(options.pages_for(3), 3);
    }

    #[test]
    fn test_limits_deserialize_rejects_unknown_fields() {
        let text = "issues = 1\npull_requests = 1\ncommits = 1\nreleases = 1\ncontributors = 1\nproject_items = 1\nwikis = 1\n";
        let _ = toml::from_str::<EntityLimits>(text).unwrap_err();
    }
}
