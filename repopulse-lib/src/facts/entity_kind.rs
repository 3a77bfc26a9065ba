use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The kinds of entities the engine knows how to canonicalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[strum(to_string = "Repository")]
    Repository,
    #[strum(to_string = "Issue")]
    Issue,
    #[strum(to_string = "Pull Request")]
    PullRequest,
    #[strum(to_string = "Commit")]
    Commit,
    #[strum(to_string = "Release")]
    Release,
    #[strum(to_string = "Contributor")]
    Contributor,
    #[strum(to_string = "Item")]
    ProjectItem,
    #[strum(to_string = "Project")]
    Project,
}

impl EntityKind {
    /// Placeholder title for an entity whose payload carries none.
    #[must_use]
    pub fn untitled(self) -> String {
        format!("Untitled {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_untitled_labels() {
        assert_eq!(EntityKind::Issue.untitled(), "Untitled Issue");
        assert_eq!(EntityKind::PullRequest.untitled(), "Untitled Pull Request");
        assert_eq!(EntityKind::ProjectItem.untitled(), "Untitled Item");
    }

    #[test]
    fn test_every_kind_has_a_label() {
        for kind in EntityKind::iter() {
            assert!(!kind.to_string().is_empty());
        }
    }
}
