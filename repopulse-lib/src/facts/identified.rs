use super::{Commit, Contributor, Issue, Project, ProjectItem, PullRequest, Release, Repository};
use core::fmt::Display;
use core::hash::Hash;

/// A canonical fact with an identity that is unique within its owning repository
/// (or owner, for projects).
pub trait Identified {
    type Id: Ord + Hash + Clone + Display;

    fn id(&self) -> Self::Id;
}

impl Identified for Repository {
    type Id = String;

    fn id(&self) -> String {
        self.full_name()
    }
}

impl Identified for Issue {
    type Id = u64;

    fn id(&self) -> u64 {
        self.number
    }
}

impl Identified for PullRequest {
    type Id = u64;

    fn id(&self) -> u64 {
        self.number
    }
}

impl Identified for Commit {
    type Id = String;

    fn id(&self) -> String {
        self.sha.clone()
    }
}

impl Identified for Release {
    type Id = String;

    fn id(&self) -> String {
        self.tag.clone()
    }
}

impl Identified for Contributor {
    type Id = String;

    fn id(&self) -> String {
        self.login.clone()
    }
}

impl Identified for ProjectItem {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Identified for Project {
    type Id = u64;

    fn id(&self) -> u64 {
        self.number
    }
}
