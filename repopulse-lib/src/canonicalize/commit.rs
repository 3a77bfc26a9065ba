use super::fields::Fields;
use super::{Canonical, ValidationError, actor};
use crate::facts::{Commit, EntityKind};
use serde_json::Value;

impl Canonical for Commit {
    const KIND: EntityKind = EntityKind::Commit;

    fn from_rest(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let sha = f.text("sha").ok_or_else(|| f.missing(&["sha"]))?;
        let message = f.string("commit.message").unwrap_or_default();

        Ok(Self {
            sha,
            headline: headline(&message),
            message,
            author_name: actor(f.str("commit.author.name")),
            author_login: f.text("author.login"),
            authored_at: f.timestamp("commit.author.date"),
            committed_at: f.timestamp("commit.committer.date"),
            additions: f.u64("stats.additions"),
            deletions: f.u64("stats.deletions"),
            url: f.string("html_url"),
        })
    }

    fn from_graphql(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let sha = f.text("oid").ok_or_else(|| f.missing(&["oid"]))?;
        let message = f.string("message").unwrap_or_default();

        Ok(Self {
            sha,
            headline: f.text("messageHeadline").unwrap_or_else(|| headline(&message)),
            message,
            author_name: actor(f.str("author.name")),
            author_login: f.text("author.user.login"),
            authored_at: f.timestamp("authoredDate"),
            committed_at: f.timestamp("committedDate"),
            additions: f.u64("additions"),
            deletions: f.u64("deletions"),
            url: f.string("url"),
        })
    }

    fn from_cli(value: &Value) -> Result<Self, ValidationError> {
        let f = Fields::of(Self::KIND, value)?;
        let sha = f.text("oid").ok_or_else(|| f.missing(&["oid"]))?;
        let headline = f.string("messageHeadline").unwrap_or_default();
        let message = match f.text("messageBody") {
            Some(body) => format!("{headline}\n\n{body}"),
            None => headline.clone(),
        };
        let author = f.list("authors").first().and_then(|a| Fields::of(Self::KIND, a).ok());

        Ok(Self {
            sha,
            headline,
            message,
            author_name: actor(author.and_then(|a| a.str("name"))),
            author_login: author.and_then(|a| a.text("login")),
            authored_at: f.timestamp("authoredDate"),
            committed_at: f.timestamp("committedDate"),
            additions: None,
            deletions: None,
            url: None,
        })
    }
}

fn headline(message: &str) -> String {
    message.lines().next().unwrap_or_default().trim_end().to_string()
}
