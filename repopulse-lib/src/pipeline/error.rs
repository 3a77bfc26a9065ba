use super::{Phase, RunLogEntry};
use crate::collect::{RepoFailure, RepoFailureCause};
use crate::source::ErrorClass;
use core::time::Duration;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a run had to stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalCause {
    #[error("no API credential available: {message}")]
    CredentialUnavailable { message: String },

    #[error("could not set up the API client: {message}")]
    ConnectionFailed { message: String },

    #[error("no project found for {target}")]
    ProjectNotFound { target: String },

    #[error("{target} is ambiguous, {} equally recent candidates: {}", candidates.len(), candidates.join(", "))]
    Ambiguous { target: String, candidates: Vec<String> },

    #[error("project {project} is not linked to any repository")]
    NoRepositories { project: String },

    #[error("API request failed: {0}")]
    Api(RepoFailureCause),

    #[error("collection needs about {estimate} API calls but only {remaining} remain until the quota resets in {}s", wait.as_secs())]
    InfeasibleBudget { estimate: u64, remaining: u64, wait: Duration },

    #[error("the API rejected the credentials while collecting {repository}")]
    CredentialsRejected { repository: String },

    #[error("all {count} repositories failed to collect")]
    AllRepositoriesFailed { count: usize, class: ErrorClass },
}

impl FatalCause {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::CredentialUnavailable { .. } | Self::CredentialsRejected { .. } => ErrorClass::Authorization,
            Self::ConnectionFailed { .. } => ErrorClass::Permanent,
            Self::ProjectNotFound { .. } | Self::Ambiguous { .. } | Self::NoRepositories { .. } => ErrorClass::Validation,
            Self::Api(cause) => cause.class(),
            Self::InfeasibleBudget { .. } => ErrorClass::Transient,
            Self::AllRepositoriesFailed { class, .. } => *class,
        }
    }

    /// Ordered steps the user can take to recover.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            Self::CredentialUnavailable { .. } => &["Pass a token with --github-token", "Or export GITHUB_TOKEN before running"],
            Self::ConnectionFailed { .. } => &["Check the api_url setting in the configuration file"],
            Self::ProjectNotFound { .. } => &[
                "Check the owner name and project number",
                "Make sure the token can read the owner's projects (read:project scope)",
                "Closed projects are only considered when selected by number",
            ],
            Self::Ambiguous { .. } => &["Select one of the listed projects with --project <NUMBER>"],
            Self::NoRepositories { .. } => &[
                "Link at least one repository to the project",
                "Or add issues or pull requests from a repository to the project",
            ],
            Self::Api(RepoFailureCause::RateLimited { .. }) | Self::InfeasibleBudget { .. } => &[
                "Wait for the API quota to reset and run again",
                "Lower the per-entity limits in the configuration file to need fewer calls",
            ],
            Self::Api(RepoFailureCause::Unauthorized | RepoFailureCause::Forbidden) | Self::CredentialsRejected { .. } => &[
                "Check that the token is valid and has not expired",
                "Make sure the token has the repo and read:project scopes",
            ],
            Self::Api(_) => &["Check network connectivity and run again"],
            Self::AllRepositoriesFailed { .. } => &[
                "Review the failed repositories listed in the context",
                "Run again with --log-level debug for details",
            ],
        };

        lines.iter().map(|s| (*s).to_string()).collect()
    }
}

impl Serialize for FatalCause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Structured information about the state of a run when it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ErrorContext {
    pub inputs: BTreeMap<String, String>,
    pub counters: BTreeMap<String, u64>,
    pub candidates: Vec<String>,
    pub failures: Vec<RepoFailure>,
}

/// An error that halts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{phase} failed: {cause}")]
pub struct FatalError {
    pub class: ErrorClass,
    pub phase: Phase,
    pub cause: FatalCause,
    pub suggestions: Vec<String>,
    pub context: ErrorContext,
}

impl FatalError {
    #[must_use]
    pub fn new(phase: Phase, cause: FatalCause, context: ErrorContext) -> Self {
        Self {
            class: cause.class(),
            phase,
            suggestions: cause.suggestions(),
            cause,
            context,
        }
    }
}

/// A failed run: the fatal error plus everything the run recorded before it.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: FatalError,
    pub run_log: Vec<RunLogEntry>,
}
