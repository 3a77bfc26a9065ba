use super::EntitySource;
use crate::Result;
use core::fmt::{Debug, Formatter};
use ohno::bail;

/// An API credential. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("credential is empty");
        }

        Ok(Self { token })
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}

/// Supplies the credential a run authenticates with.
pub trait AuthProvider {
    fn get_token(&self) -> Result<Credential>;
}

/// A token handed over up front, e.g. from the command line or `GITHUB_TOKEN`.
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    #[must_use]
    pub const fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl AuthProvider for StaticToken {
    fn get_token(&self) -> Result<Credential> {
        match self.token.as_deref() {
            Some(token) => Credential::new(token),
            None => bail!("no API token available"),
        }
    }
}

/// Builds an entity query source for a credential.
pub trait Connector {
    type Source: EntitySource;

    fn connect(&self, credential: &Credential) -> Result<Self::Source>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("ghp_secret").unwrap();
        let debug = format!("{credential:?}");

        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_static_token() {
        let credential = StaticToken::new(Some("abc".to_string())).get_token().unwrap();
        assert_eq!(credential.token(), "abc");
    }

    #[test]
    fn test_missing_or_blank_token_is_an_error() {
        let _ = StaticToken::new(None).get_token().unwrap_err();
        let _ = StaticToken::new(Some("  ".to_string())).get_token().unwrap_err();
    }
}
