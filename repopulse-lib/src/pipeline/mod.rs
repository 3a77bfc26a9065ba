//! The phase pipeline
//!
//! A run moves through `DETECT → COLLECT → ANALYZE → DONE`:
//!
//! - **DETECT** resolves a [`ProjectRef`] to exactly one project, lists its items, and derives
//!   the set of repositories to collect.
//! - **COLLECT** checks that the API quota covers the estimated number of calls and then
//!   collects every repository with bounded concurrency. Individual repository failures
//!   degrade the run; rejected credentials or a complete failure end it.
//! - **ANALYZE** aggregates the collected facts into an [`OutputBundle`].
//!
//! Any fatal condition moves the run to `ERROR` and is reported as a [`RunFailure`] that
//! carries the [`FatalError`] together with the run log recorded so far.

mod bundle;
mod detect;
mod error;
mod orchestrator;
mod phase;
mod project_ref;
mod run_log;

pub use bundle::{Entities, OutputBundle, RunState, RunStatus};
pub use error::{ErrorContext, FatalCause, FatalError, RunFailure};
pub use orchestrator::PhaseOrchestrator;
pub use phase::Phase;
pub use project_ref::ProjectRef;
pub use run_log::{EventOutcome, RunLog, RunLogEntry};
