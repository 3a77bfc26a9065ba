//! Typed, path-based access to the fields of a raw JSON object.
//!
//! Lookups never coerce: a field whose JSON type does not match the requested type is
//! reported as absent, and the caller substitutes the documented default.

use super::ValidationError;
use crate::facts::EntityKind;
use chrono::{DateTime, Datelike, Utc};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    kind: EntityKind,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn of(kind: EntityKind, value: &'a Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self { kind, map }),
            other => Err(ValidationError::NotAnObject {
                kind,
                found: json_type_name(other),
            }),
        }
    }

    /// Builds the error for missing identity fields.
    pub fn missing(&self, fields: &[&'static str]) -> ValidationError {
        ValidationError::MissingIdentity {
            kind: self.kind,
            fields: fields.to_vec(),
        }
    }

    /// Resolves a dotted path such as `author.user.login`. JSON `null` counts as absent.
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let mut current = self.map.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        if current.is_null() { None } else { Some(current) }
    }

    pub fn str(&self, path: &str) -> Option<&'a str> {
        self.get(path)?.as_str()
    }

    pub fn string(&self, path: &str) -> Option<String> {
        self.str(path).map(str::to_string)
    }

    /// A string field, treating empty or whitespace-only text as absent.
    pub fn text(&self, path: &str) -> Option<String> {
        self.str(path).filter(|s| !s.trim().is_empty()).map(str::to_string)
    }

    pub fn u64(&self, path: &str) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    pub fn bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// An RFC 3339 timestamp. The zero instant `0001-01-01T00:00:00Z`, which some tools
    /// emit in place of `null`, is treated as absent.
    pub fn timestamp(&self, path: &str) -> Option<DateTime<Utc>> {
        let ts = DateTime::parse_from_rfc3339(self.str(path)?).ok()?.with_timezone(&Utc);
        if ts.year() <= 1 { None } else { Some(ts) }
    }

    /// A count expressed as a number, a `{ totalCount }` connection, or an array whose length is the count.
    pub fn count(&self, path: &str) -> Option<u64> {
        match self.get(path)? {
            Value::Number(n) => n.as_u64(),
            Value::Object(obj) => obj.get("totalCount")?.as_u64(),
            Value::Array(items) => u64::try_from(items.len()).ok(),
            _ => None,
        }
    }

    /// The elements of a list expressed as a plain array or as a `{ nodes: [...] }` connection.
    pub fn list(&self, path: &str) -> &'a [Value] {
        match self.get(path) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::Object(obj)) => obj.get("nodes").and_then(Value::as_array).map_or(&[][..], Vec::as_slice),
            _ => &[],
        }
    }

    /// Collects `key` from every element of a list; bare string elements are taken as-is.
    pub fn names(&self, path: &str, key: &str) -> Vec<String> {
        self.list(path)
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get(key).and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }

    /// A nested object viewed through the same accessors.
    pub fn nested(&self, path: &str) -> Option<Self> {
        match self.get(path)? {
            Value::Object(map) => Some(Self { kind: self.kind, map }),
            _ => None,
        }
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
