use crate::facts::{Project, RepoSpec};
use core::fmt::{Display, Formatter};

/// What the caller knows about the project to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    /// A specific project of an owner.
    Explicit { owner: String, number: u64 },

    /// The open projects of an owner that a given repository is linked to, typically
    /// derived from the repository the tool runs in.
    Inferred { owner: String, repository: RepoSpec },

    /// Any open project of an owner.
    Owner { owner: String },
}

impl ProjectRef {
    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::Explicit { owner, .. } | Self::Inferred { owner, .. } | Self::Owner { owner } => owner,
        }
    }

    /// Whether `project` is a candidate for this reference.
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            Self::Explicit { number, .. } => project.number == *number,
            Self::Inferred { repository, .. } => {
                let wanted = repository.full_name();
                !project.is_closed && project.repositories.iter().any(|r| r.eq_ignore_ascii_case(&wanted))
            }
            Self::Owner { .. } => !project.is_closed,
        }
    }
}

impl Display for ProjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Explicit { owner, number } => write!(f, "project {owner}#{number}"),
            Self::Inferred { owner, repository } => write!(f, "open projects of '{owner}' linked to '{repository}'"),
            Self::Owner { owner } => write!(f, "open projects of '{owner}'"),
        }
    }
}
