//! Repository and project collection
//!
//! [`RepositoryCollector`] drives every entity listing of one repository through the
//! [`RateGovernor`](crate::governor::RateGovernor), canonicalizing each page as it
//! arrives. [`ProjectCollector`] fans out over all repositories of a project with a
//! bounded number in flight and merges the per-repository results into a
//! [`CollectionOutcome`]. A repository that fails is recorded as a [`RepoFailure`] and
//! never aborts the rest.

mod options;
mod outcome;
mod paginate;
mod project_collector;
mod repository_collector;

pub use options::{CollectOptions, EntityLimits};
pub use outcome::{CollectionOutcome, CollectionStatus, RepoFailure, RepoFailureCause};
pub(crate) use paginate::paginate;
pub use project_collector::{CancelHandle, ProjectCollector};
pub use repository_collector::RepositoryCollector;
