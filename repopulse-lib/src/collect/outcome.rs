use crate::canonicalize::ValidationError;
use crate::facts::{RepoFacts, RepoSpec};
use crate::governor::CallError;
use crate::source::{ErrorClass, SourceError};
use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::{Serialize, Serializer};
use strum::Display;
use thiserror::Error;

/// Why a repository could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoFailureCause {
    #[error(transparent)]
    Validation(ValidationError),

    #[error("rate limited for {}s, quota resets at {reset_at}", wait.as_secs())]
    RateLimited { wait: Duration, reset_at: DateTime<Utc> },

    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: SourceError },

    #[error("credentials were rejected")]
    Unauthorized,

    #[error("access forbidden")]
    Forbidden,

    #[error("repository not found")]
    NotFound,

    #[error("malformed response: {message}")]
    Malformed { message: String },

    #[error("collection was cancelled before this repository started")]
    Cancelled,
}

impl RepoFailureCause {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::Cancelled => ErrorClass::Validation,
            Self::RateLimited { .. } | Self::Exhausted { .. } => ErrorClass::Transient,
            Self::Unauthorized | Self::Forbidden => ErrorClass::Authorization,
            Self::NotFound | Self::Malformed { .. } => ErrorClass::Permanent,
        }
    }

    /// A stable machine-readable name for the cause.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::Exhausted { .. } => "retries_exhausted",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Malformed { .. } => "malformed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<CallError> for RepoFailureCause {
    fn from(error: CallError) -> Self {
        match error {
            CallError::RateLimited { wait, reset_at } => Self::RateLimited { wait, reset_at },
            CallError::Exhausted { attempts, last } => Self::Exhausted { attempts, last },
            CallError::Rejected(SourceError::Unauthorized) => Self::Unauthorized,
            CallError::Rejected(SourceError::Forbidden) => Self::Forbidden,
            CallError::Rejected(SourceError::NotFound) => Self::NotFound,
            CallError::Rejected(SourceError::Malformed { message }) => Self::Malformed { message },
            // Transient errors only reach here without retry when the policy allows none.
            CallError::Rejected(last) => Self::Exhausted { attempts: 1, last },
        }
    }
}

impl From<ValidationError> for RepoFailureCause {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}

impl Serialize for RepoFailureCause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A repository that could not be collected, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoFailure {
    pub repository: RepoSpec,
    pub code: &'static str,
    pub class: ErrorClass,
    pub cause: RepoFailureCause,
}

impl RepoFailure {
    #[must_use]
    pub fn new(repository: RepoSpec, cause: RepoFailureCause) -> Self {
        Self {
            repository,
            code: cause.code(),
            class: cause.class(),
            cause,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollectionStatus {
    /// Every repository was collected.
    Complete,
    /// Some, but not all, repositories failed.
    Degraded,
    /// Every repository failed.
    Failed,
}

/// The merged result of collecting every repository of a project.
///
/// Successes and failures are sorted by repository, independent of completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub successes: Vec<RepoFacts>,
    pub failures: Vec<RepoFailure>,
    pub status: CollectionStatus,
}

impl CollectionOutcome {
    #[must_use]
    pub fn from_results(results: impl IntoIterator<Item = Result<RepoFacts, RepoFailure>>) -> Self {
        let (mut successes, mut failures): (Vec<_>, Vec<_>) = (Vec::new(), Vec::new());
        for result in results {
            match result {
                Ok(facts) => successes.push(facts),
                Err(failure) => failures.push(failure),
            }
        }

        successes.sort_by(|a, b| a.spec.cmp(&b.spec));
        failures.sort_by(|a, b| a.repository.cmp(&b.repository));

        let status = match (successes.len(), failures.len()) {
            (_, 0) => CollectionStatus::Complete,
            (0, _) => CollectionStatus::Failed,
            _ => CollectionStatus::Degraded,
        };

        Self { successes, failures, status }
    }

    /// The first repository that failed because the credentials were rejected.
    #[must_use]
    pub fn rejected_credentials(&self) -> Option<&RepoFailure> {
        self.failures.iter().find(|f| f.cause == RepoFailureCause::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Repository;

    fn facts(name: &str) -> RepoFacts {
        let spec = RepoSpec::parse(name).unwrap();
        let repository = Repository {
            owner: spec.owner().to_string(),
            name: spec.name().to_string(),
            description: None,
            default_branch: None,
            is_archived: false,
            is_fork: false,
            stars: 0,
            forks: 0,
            watchers: 0,
            primary_language: None,
            created_at: None,
            pushed_at: None,
            url: None,
        };
        RepoFacts::new(spec, repository)
    }

    fn failure(name: &str, cause: RepoFailureCause) -> RepoFailure {
        RepoFailure::new(RepoSpec::parse(name).unwrap(), cause)
    }

    #[test]
    fn test_status_accounting() {
        let complete = CollectionOutcome::from_results([Ok(facts("o/a")), Ok(facts("o/b"))]);
        assert_eq!(complete.status, CollectionStatus::Complete);

        let degraded = CollectionOutcome::from_results([Ok(facts("o/a")), Err(failure("o/b", RepoFailureCause::NotFound))]);
        assert_eq!(degraded.status, CollectionStatus::Degraded);
        assert_eq!(degraded.successes.len() + degraded.failures.len(), 2);

        let failed = CollectionOutcome::from_results([
            Err(failure("o/a", RepoFailureCause::Forbidden)),
            Err(failure("o/b", RepoFailureCause::NotFound)),
        ]);
        assert_eq!(failed.status, CollectionStatus::Failed);
    }

    #[test]
    fn test_results_are_sorted_regardless_of_completion_order() {
        let outcome = CollectionOutcome::from_results([
            Ok(facts("o/c")),
            Err(failure("o/z", RepoFailureCause::NotFound)),
            Ok(facts("o/a")),
            Err(failure("o/b", RepoFailureCause::Forbidden)),
        ]);

        let successes: Vec<_> = outcome.successes.iter().map(|f| f.spec.full_name()).collect();
        let failures: Vec<_> = outcome.failures.iter().map(|f| f.repository.full_name()).collect();
        assert_eq!(successes, ["o/a", "o/c"]);
        assert_eq!(failures, ["o/b", "o/z"]);
    }

    #[test]
    fn test_call_errors_map_to_causes() {
        assert_eq!(
            RepoFailureCause::from(CallError::Rejected(SourceError::Unauthorized)),
            RepoFailureCause::Unauthorized
        );
        assert_eq!(
            RepoFailureCause::from(CallError::Rejected(SourceError::NotFound)),
            RepoFailureCause::NotFound
        );
        assert_eq!(RepoFailureCause::Forbidden.class(), ErrorClass::Authorization);
        assert_eq!(RepoFailureCause::Cancelled.code(), "cancelled");
    }

    #[test]
    fn test_failure_serializes_cause_as_text() {
        let json = serde_json::to_value(failure("o/a", RepoFailureCause::NotFound)).unwrap();
        assert_eq!(json["repository"], "o/a");
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["class"], "permanent");
        assert_eq!(json["cause"], "repository not found");
    }

    #[test]
    fn test_rejected_credentials_detected() {
        let outcome = CollectionOutcome::from_results([Ok(facts("o/a")), Err(failure("o/b", RepoFailureCause::Unauthorized))]);
        assert_eq!(outcome.rejected_credentials().unwrap().repository.full_name(), "o/b");
    }
}
