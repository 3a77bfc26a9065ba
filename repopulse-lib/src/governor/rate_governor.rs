use super::QuotaCounter;
use crate::source::{ErrorClass, QuotaResource, QuotaSnapshot, SourceError, SourcePage, SourceResult};
use chrono::{DateTime, Utc};
use core::time::Duration;
use thiserror::Error;

const LOG_TARGET: &str = "  governor";

/// Upper bound for the backoff between transient retries.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry and timeout settings for governed calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt for timeouts, server errors and network failures.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl RetryPolicy {
    /// The delay before retry number `attempt` (zero-based): `base_delay × 2^attempt`, capped at 30 s.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A governed call that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The quota is exhausted. Nothing waits on this; the caller decides what to do with `wait`.
    #[error("rate limited for {}s, quota resets at {reset_at}", wait.as_secs())]
    RateLimited { wait: Duration, reset_at: DateTime<Utc> },

    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: SourceError },

    /// A failure that retrying cannot fix (authorization, not found, malformed response).
    #[error(transparent)]
    Rejected(SourceError),
}

impl CallError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } | Self::Exhausted { .. } => ErrorClass::Transient,
            Self::Rejected(e) => e.class(),
        }
    }
}

/// Something a governed call can return, carrying whatever quota the source reported with it.
pub trait Metered {
    fn quota(&self) -> Option<QuotaSnapshot>;
}

impl Metered for SourcePage {
    fn quota(&self) -> Option<QuotaSnapshot> {
        self.quota
    }
}

impl Metered for QuotaSnapshot {
    fn quota(&self) -> Option<QuotaSnapshot> {
        Some(*self)
    }
}

/// Gates every source call of a run: quota accounting, rate-limit short-circuiting,
/// per-call timeouts, and bounded retries for transient failures.
///
/// Rate limits are never slept on. Once a call reports one, every later call against the same
/// budget fails fast with the same [`CallError::RateLimited`] until the reset instant passes.
#[derive(Debug, Default)]
pub struct RateGovernor {
    counter: QuotaCounter,
    policy: RetryPolicy,
}

impl RateGovernor {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            counter: QuotaCounter::new(),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Merges a quota snapshot obtained outside of a governed call.
    pub fn observe(&self, snapshot: QuotaSnapshot) {
        self.counter.observe(snapshot);
    }

    /// The last known quota of `resource`.
    #[must_use]
    pub fn snapshot(&self, resource: QuotaResource) -> Option<QuotaSnapshot> {
        self.counter.snapshot(resource)
    }

    /// Number of source calls completed so far, failed attempts included.
    #[must_use]
    pub fn calls_made(&self) -> u64 {
        self.counter.calls()
    }

    /// The rate-limit error a call against `resource` issued at `now` would fail with, if that budget is exhausted.
    #[must_use]
    pub fn rate_limited_until(&self, resource: QuotaResource, now: DateTime<Utc>) -> Option<CallError> {
        let snapshot = self.counter.snapshot(resource)?;
        (snapshot.remaining == 0 && snapshot.reset_at > now).then(|| rate_limited(snapshot.reset_at, now))
    }

    /// Runs `op`, which draws from the `resource` budget, under the governor. `what` names the call in logs.
    ///
    /// `op` is invoked once per attempt and must produce a fresh request each time.
    pub async fn call<T, F, Fut>(&self, what: &str, resource: QuotaResource, mut op: F) -> Result<T, CallError>
    where
        T: Metered,
        F: FnMut() -> Fut,
        Fut: Future<Output = SourceResult<T>>,
    {
        let mut attempt = 0;
        loop {
            if let Some(error) = self.rate_limited_until(resource, Utc::now()) {
                log::debug!(target: LOG_TARGET, "Skipping {what}: {error}");
                return Err(error);
            }

            let outcome = tokio::time::timeout(self.policy.request_timeout, op())
                .await
                .unwrap_or(Err(SourceError::Timeout));

            match outcome {
                Ok(value) => {
                    self.counter.record_call(resource, value.quota());
                    return Ok(value);
                }

                Err(SourceError::RateLimited { reset_at }) => {
                    let limit = self.counter.snapshot(resource).map_or(0, |s| s.limit);
                    self.counter.record_call(
                        resource,
                        Some(QuotaSnapshot {
                            resource,
                            remaining: 0,
                            limit,
                            reset_at,
                        }),
                    );

                    let error = rate_limited(reset_at, Utc::now());
                    log::warn!(target: LOG_TARGET, "Hit the API rate limit during {what}: {error}");
                    return Err(error);
                }

                Err(error) if error.is_retryable() && attempt < self.policy.max_retries => {
                    self.counter.record_call(resource, None);
                    let delay = self.policy.backoff(attempt);
                    attempt += 1;
                    log::debug!(
                        target: LOG_TARGET,
                        "{what} failed ({error}), retrying in {}ms (retry {attempt}/{})",
                        delay.as_millis(),
                        self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }

                Err(error) if error.is_retryable() => {
                    self.counter.record_call(resource, None);
                    log::warn!(target: LOG_TARGET, "Giving up on {what} after {} attempt(s): {error}", attempt + 1);
                    return Err(CallError::Exhausted {
                        attempts: attempt + 1,
                        last: error,
                    });
                }

                Err(error) => {
                    self.counter.record_call(resource, None);
                    return Err(CallError::Rejected(error));
                }
            }
        }
    }
}

fn rate_limited(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> CallError {
    CallError::RateLimited {
        wait: (reset_at - now).to_std().unwrap_or(Duration::ZERO),
        reset_at,
    }
}
