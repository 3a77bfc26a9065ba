//! Rate governance
//!
//! Everything that decides whether, when, and how often a source call is made:
//!
//! - [`estimate_required_calls`] and [`check_feasible`] decide up front whether a
//!   collection fits in the remaining quota, and [`Feasibility::concurrency_limit`]
//!   sizes the fan-out accordingly.
//! - [`RateGovernor`] wraps each call with a timeout, retries transient failures with
//!   exponential backoff, and turns rate limits into [`CallError::RateLimited`] values
//!   carrying the wait instead of sleeping on them.
//! - [`QuotaCounter`] is the quota state shared by all concurrent fetches.
//! - [`Throttler`] bounds how many repositories are in flight and lets a run be cancelled.

mod feasibility;
mod quota_counter;
mod rate_governor;
mod throttler;

pub use feasibility::{CallEstimate, Feasibility, check_feasible, estimate_required_calls};
pub use quota_counter::QuotaCounter;
pub use rate_governor::{CallError, Metered, RateGovernor, RetryPolicy};
pub use throttler::Throttler;
