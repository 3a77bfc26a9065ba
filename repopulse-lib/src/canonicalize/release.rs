use super::fields::Fields;
use super::{Canonical, ValidationError, actor};
use crate::facts::{EntityKind, Release};
use serde_json::Value;

impl Canonical for Release {
    const KIND: EntityKind = EntityKind::Release;

    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let tag = f.text("tag_name").ok_or_else(|| f.missing(&["tag_name"]))?;

        Ok(Self {
            name: f.text("name").unwrap_or_else(|| tag.clone()),
            tag,
            author: actor(f.str("author.login")),
            is_draft: f.bool("draft").unwrap_or(false),
            is_prerelease: f.bool("prerelease").unwrap_or(false),
            created_at: f.timestamp("created_at"),
            published_at: f.timestamp("published_at"),
            url: f.string("html_url"),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let tag = f.text("tagName").ok_or_else(|| f.missing(&["tagName"]))?;

        Ok(Self {
            name: f.text("name").unwrap_or_else(|| tag.clone()),
            tag,
            author: actor(f.str("author.login")),
            is_draft: f.bool("isDraft").unwrap_or(false),
            is_prerelease: f.bool("isPrerelease").unwrap_or(false),
            created_at: f.timestamp("createdAt"),
            published_at: f.timestamp("publishedAt"),
            url: f.string("url"),
        })
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        // `gh release list --json` has no author or URL fields.
        let f = Fields::of(Self::KIND, value)?;
        let tag = f.text("tagName").ok_or_else(|| f.missing(&["tagName"]))?;

        Ok(Self {
            name: f.text("name").unwrap_or_else(|| tag.clone()),
            tag,
            author: actor(None),
            is_draft: f.bool("isDraft").unwrap_or(false),
            is_prerelease: f.bool("isPrerelease").unwrap_or(false),
            created_at: f.timestamp("createdAt"),
            published_at: f.timestamp("publishedAt"),
            url: None,
        })
    }
}
