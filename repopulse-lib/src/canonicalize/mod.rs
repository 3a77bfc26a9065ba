//! Source payload canonicalization
//!
//! Entities arrive in one of three shapes, and the caller always states which one it is
//! providing by wrapping the raw JSON in the matching [`SourcePayload`] variant:
//!
//! - **REST**: GitHub REST v3 objects (`snake_case`, `user.login`, `html_url`, ...)
//! - **GraphQL**: GitHub GraphQL v4 nodes (`camelCase`, `{ nodes }` / `{ totalCount }` connections)
//! - **CLI**: the `gh ... --json` output (`camelCase`, flattened lists, zero timestamps for "unset")
//!
//! Each canonical type implements [`Canonical`] with one pure function per shape, and
//! [`canonicalize`] dispatches on the variant. Nothing is probed at runtime.
//!
//! # Defaults
//!
//! Optional data is default-filled rather than rejected: a missing title becomes
//! `Untitled <Type>`, a missing actor becomes [`UNKNOWN_ACTOR`], lists become empty,
//! flags become `false`, and timestamps, URLs, and anything a shape cannot express
//! stay `None`. Only a missing identity field (or a payload that is not an object at
//! all) is an error, reported as a [`ValidationError`] naming every missing field.

mod commit;
mod contributor;
mod error;
mod fields;
mod issue;
mod project;
mod project_item;
mod pull_request;
mod release;
mod repository;

pub use error::ValidationError;

use crate::facts::EntityKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// Placeholder for an author, committer, or other actor the payload does not name.
pub const UNKNOWN_ACTOR: &str = "unknown";

/// The shape a raw payload was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceShape {
    Rest,
    #[serde(rename = "graphql")]
    #[strum(to_string = "graphql")]
    GraphQl,
    Cli,
}

impl SourceShape {
    /// Tags a raw value as being in this shape.
    #[must_use]
    pub fn wrap(self, value: Value) -> SourcePayload {
        match self {
            Self::Rest => SourcePayload::Rest(value),
            Self::GraphQl => SourcePayload::GraphQl(value),
            Self::Cli => SourcePayload::Cli(value),
        }
    }
}

/// A raw entity payload tagged with its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePayload {
    Rest(Value),
    GraphQl(Value),
    Cli(Value),
}

impl SourcePayload {
    #[must_use]
    pub const fn shape(&self) -> SourceShape {
        match self {
            Self::Rest(_) => SourceShape::Rest,
            Self::GraphQl(_) => SourceShape::GraphQl,
            Self::Cli(_) => SourceShape::Cli,
        }
    }
}

/// A canonical fact type that can be built from every supported source shape.
pub trait Canonical: Sized {
    const KIND: EntityKind;

    fn from_rest(value: &Value) -> Result<Self, ValidationError>;

    fn from_graphql(value: &Value) -> Result<Self, ValidationError>;

    fn from_cli(value: &Value) -> Result<Self, ValidationError>;
}

/// Builds a canonical fact from a shape-tagged payload.
pub fn canonicalize<T: Canonical>(payload: &SourcePayload) -> Result<T, ValidationError> {
    match payload {
        SourcePayload::Rest(value) => T::from_rest(value),
        SourcePayload::GraphQl(value) => T::from_graphql(value),
        SourcePayload::Cli(value) => T::from_cli(value),
    }
}

/// Reads a person's login, falling back to [`UNKNOWN_ACTOR`].
fn actor(login: Option<&str>) -> String {
    login.filter(|l| !l.is_empty()).unwrap_or(UNKNOWN_ACTOR).to_string()
}
