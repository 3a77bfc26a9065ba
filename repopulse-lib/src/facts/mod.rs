//! Canonical facts
//!
//! These are the normalized, source-independent records the engine works on. Every
//! record is built exactly once from one raw payload by the [`canonicalize`](crate::canonicalize)
//! layer and is never mutated afterwards. Optional data is modelled with `Option`
//! rather than sentinel values, and all timestamps are `DateTime<Utc>`.

mod activity_window;
mod commit;
mod contributor;
mod entity_kind;
mod identified;
mod issue;
mod project;
mod project_item;
mod pull_request;
mod release;
mod repo_facts;
mod repo_spec;
mod repository;

pub use activity_window::{ActivityWindow, MAX_WINDOW_DAYS};
pub use commit::Commit;
pub use contributor::{Contributor, ContributorKind};
pub use entity_kind::EntityKind;
pub use identified::Identified;
pub use issue::{Issue, IssueState};
pub use project::Project;
pub use project_item::{ProjectItem, ProjectItemType};
pub use pull_request::{PullRequest, PullRequestState};
pub use release::Release;
pub use repo_facts::{RepoFacts, Scoped};
pub use repo_spec::RepoSpec;
pub use repository::Repository;
