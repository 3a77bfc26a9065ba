use super::fields::Fields;
use super::{Canonical, ValidationError};
use crate::facts::{EntityKind, Repository};
use serde_json::Value;

impl Canonical for Repository {
    const KIND: EntityKind = EntityKind::Repository;

    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let (owner, name) = identity(&f, "full_name")?;

        Ok(Self {
            owner,
            name,
            description: f.text("description"),
            default_branch: f.text("default_branch"),
            is_archived: f.bool("archived").unwrap_or(false),
            is_fork: f.bool("fork").unwrap_or(false),
            stars: f.u64("stargazers_count").unwrap_or(0),
            forks: f.u64("forks_count").unwrap_or(0),
            watchers: f.u64("subscribers_count").unwrap_or(0),
            primary_language: f.text("language"),
            created_at: f.timestamp("created_at"),
            pushed_at: f.timestamp("pushed_at"),
            url: f.string("html_url"),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        from_camel_case(value)
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        from_camel_case(value)
    }
}

fn from_camel_case(value: &Value) -> Result<Repository, ValidationError> {
    let f = Fields::of(Repository::KIND, value)?;
    let (owner, name) = identity(&f, "nameWithOwner")?;

    Ok(Repository {
        owner,
        name,
        description: f.text("description"),
        default_branch: f.text("defaultBranchRef.name"),
        is_archived: f.bool("isArchived").unwrap_or(false),
        is_fork: f.bool("isFork").unwrap_or(false),
        stars: f.count("stargazerCount").unwrap_or(0),
        forks: f.count("forkCount").unwrap_or(0),
        watchers: f.count("watchers").unwrap_or(0),
        primary_language: f.text("primaryLanguage.name"),
        created_at: f.timestamp("createdAt"),
        pushed_at: f.timestamp("pushedAt"),
        url: f.string("url"),
    })
}

/// Owner and name, taken from `owner.login`/`name` and completed from the combined
/// `owner/name` field when either is absent.
fn identity(f: &Fields<'_>, combined: &str) -> Result<(String, String), ValidationError> {
    let (combined_owner, combined_name) = f
        .str(combined)
        .and_then(|s| s.split_once('/'))
        .map_or((None, None), |(o, n)| (Some(o), Some(n)));

    let owner = f.text("owner.login").or_else(|| combined_owner.filter(|s| !s.is_empty()).map(str::to_string));
    let name = f.text("name").or_else(|| combined_name.filter(|s| !s.is_empty()).map(str::to_string));

    match (owner, name) {
        (Some(owner), Some(name)) => Ok((owner, name)),
        (None, None) => Err(f.missing(&["owner", "name"])),
        (None, Some(_)) => Err(f.missing(&["owner"])),
        (Some(_), None) => Err(f.missing(&["name"])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rest_and_graphql_agree() {
        let rest = Repository::from_rest(&json!({
            "owner": { "login": "tokio-rs" },
            "name": "tokio",
            "full_name": "tokio-rs/tokio",
            "description": "A runtime",
            "default_branch": "master",
            "archived": false,
            "fork": false,
            "stargazers_count": 100,
            "forks_count": 10,
            "subscribers_count": 5,
            "language": "Rust",
            "created_at": "2016-01-01T00:00:00Z",
            "pushed_at": "2024-01-01T00:00:00Z",
            "html_url": "https://github.com/tokio-rs/tokio"
        }))
        .unwrap();
        let graphql = Repository::from_graphql(&json!({
            "owner": { "login": "tokio-rs" },
            "name": "tokio",
            "nameWithOwner": "tokio-rs/tokio",
            "description": "A runtime",
            "defaultBranchRef": { "name": "master" },
            "isArchived": false,
            "isFork": false,
            "stargazerCount": 100,
            "forkCount": 10,
            "watchers": { "totalCount": 5 },
            "primaryLanguage": { "name": "Rust" },
            "createdAt": "2016-01-01T00:00:00Z",
            "pushedAt": "2024-01-01T00:00:00Z",
            "url": "https://github.com/tokio-rs/tokio"
        }))
        .unwrap();

        assert_eq!(rest, graphql);
        assert_eq!(rest.full_name(), "tokio-rs/tokio");
    }

    #[test]
    fn test_identity_from_combined_name() {
        let repo = Repository::from_cli(&json!({ "nameWithOwner": "serde-rs/serde" })).unwrap();
        assert_eq!(repo.owner, "serde-rs");
        assert_eq!(repo.name, "serde");
        assert_eq!(repo.stars, 0);
    }

    #[test]
    fn test_missing_owner_and_name_lists_both() {
        let err = Repository::from_rest(&json!({ "description": "orphan" })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingIdentity {
                kind: EntityKind::Repository,
                fields: vec!["owner", "name"]
            }
        );
    }

    #[test]
    fn test_missing_owner_only() {
        let err = Repository::from_graphql(&json!({ "name": "tokio" })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingIdentity {
                kind: EntityKind::Repository,
                fields: vec!["owner"]
            }
        );
    }
}
