use super::fields::Fields;
use super::{Canonical, ValidationError};
use crate::facts::{Contributor, ContributorKind, EntityKind};
use serde_json::Value;

impl Canonical for Contributor {
    const KIND: EntityKind = EntityKind::Contributor;

    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let login = f.text("login").ok_or_else(|| f.missing(&["login"]))?;

        Ok(Self {
            kind: ContributorKind::classify(f.str("type"), &login),
            contributions: f.count("contributions").unwrap_or(0),
            url: f.string("html_url"),
            login,
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let login = f.text("login").ok_or_else(|| f.missing(&["login"]))?;

        Ok(Self {
            kind: ContributorKind::classify(f.str("__typename"), &login),
            contributions: f.count("contributions").unwrap_or(0),
            url: f.string("url"),
            login,
        })
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let login = f.text("login").ok_or_else(|| f.missing(&["login"]))?;

        Ok(Self {
            kind: ContributorKind::classify(None, &login),
            contributions: f.count("contributions").unwrap_or(0),
            url: None,
            login,
        })
    }
}
