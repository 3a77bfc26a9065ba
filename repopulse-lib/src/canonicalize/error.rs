use crate::facts::EntityKind;
use thiserror::Error;

/// A raw payload that cannot be turned into a canonical fact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} payload is not an object (found {found})")]
    NotAnObject { kind: EntityKind, found: &'static str },

    #[error("{kind} payload is missing required identity field(s): {}", fields.join(", "))]
    MissingIdentity { kind: EntityKind, fields: Vec<&'static str> },
}

impl ValidationError {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::NotAnObject { kind, .. } | Self::MissingIdentity { kind, .. } => *kind,
        }
    }
}
