use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// How a failure should be treated by whoever observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// Bad input or an unresolvable situation; retrying cannot help.
    Validation,
    /// Timeouts, server errors, network failures and rate limits.
    Transient,
    /// Credentials are missing, rejected, or lack access.
    Authorization,
    /// The resource does not exist or the response cannot be understood.
    Permanent,
}

/// A failed call against an entity query source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("rate limit exceeded, quota resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("request timed out")]
    Timeout,

    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    #[error("network failure: {message}")]
    Network { message: String },

    #[error("credentials were rejected")]
    Unauthorized,

    #[error("access forbidden")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl SourceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout | Self::Server { .. } | Self::Network { .. } => ErrorClass::Transient,
            Self::Unauthorized | Self::Forbidden => ErrorClass::Authorization,
            Self::NotFound | Self::Malformed { .. } => ErrorClass::Permanent,
        }
    }

    /// Whether the same call may succeed if simply repeated after a backoff.
    ///
    /// Rate limits are transient too, but they carry their own wait and are never retried blindly.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Server { .. } | Self::Network { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(SourceError::Timeout.class(), ErrorClass::Transient);
        assert_eq!(SourceError::Server { status: 502 }.class(), ErrorClass::Transient);
        assert_eq!(SourceError::Unauthorized.class(), ErrorClass::Authorization);
        assert_eq!(SourceError::Forbidden.class(), ErrorClass::Authorization);
        assert_eq!(SourceError::NotFound.class(), ErrorClass::Permanent);
        assert_eq!(SourceError::malformed("x").class(), ErrorClass::Permanent);
    }

    #[test]
    fn test_rate_limit_is_transient_but_not_retryable() {
        let err = SourceError::RateLimited { reset_at: Utc::now() };
        assert_eq!(err.class(), ErrorClass::Transient);
        assert!(!err.is_retryable());
        assert!(SourceError::network("reset by peer").is_retryable());
        assert!(!SourceError::NotFound.is_retryable());
    }

    #[test]
    fn test_class_display() {
        assert_eq!(ErrorClass::Authorization.to_string(), "authorization");
    }
}
