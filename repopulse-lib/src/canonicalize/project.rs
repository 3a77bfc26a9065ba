use super::fields::Fields;
use super::{Canonical, ValidationError};
use crate::facts::{EntityKind, Project};
use serde_json::Value;

impl Canonical for Project {
    const KIND: EntityKind = EntityKind::Project;

    /// Classic (v1) projects as returned by `GET /orgs/{org}/projects`.
    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let (owner, number) = identity(&f, f.text("owner.login").or_else(|| f.text("creator.login")))?;

        Ok(Self {
            owner,
            number,
            title: f.text("name").unwrap_or_else(|| Self::KIND.untitled()),
            is_closed: f.str("state").is_some_and(|s| s.eq_ignore_ascii_case("closed")),
            updated_at: f.timestamp("updated_at"),
            url: f.string("html_url"),
            repositories: Vec::new(),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let (owner, number) = identity(&f, f.text("owner.login"))?;

        Ok(Self {
            owner,
            number,
            title: f.text("title").unwrap_or_else(|| Self::KIND.untitled()),
            is_closed: f.bool("closed").unwrap_or(false),
            updated_at: f.timestamp("updatedAt"),
            url: f.string("url"),
            repositories: f.names("repositories", "nameWithOwner"),
        })
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let (owner, number) = identity(&f, f.text("owner.login"))?;

        Ok(Self {
            owner,
            number,
            title: f.text("title").unwrap_or_else(|| Self::KIND.untitled()),
            is_closed: f.bool("closed").unwrap_or(false),
            updated_at: f.timestamp("updatedAt"),
            url: f.string("url"),
            repositories: Vec::new(),
        })
    }
}

fn identity(f: &Fields<'_>, owner: Option<String>) -> Result<(String, u64), ValidationError> {
    match (owner, f.u64("number")) {
        (Some(owner), Some(number)) => Ok((owner, number)),
        (None, None) => Err(f.missing(&["owner", "number"])),
        (None, Some(_)) => Err(f.missing(&["owner"])),
        (Some(_), None) => Err(f.missing(&["number"])),
    }
}
