use crate::Result;
use chrono::{DateTime, Duration, Utc};
use ohno::bail;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86400.0;

/// The longest window that can be measured, in days (a century).
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// The half-open time range `[since, until)` that activity is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl ActivityWindow {
    /// A window whose previous window must also be representable.
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self> {
        if since > until {
            bail!("activity window starts after it ends ({since} > {until})");
        }

        if since.checked_sub_signed(until - since).is_none() {
            bail!("activity window from {since} to {until} reaches outside the representable time range");
        }

        Ok(Self { since, until })
    }

    /// The window covering the `days` days that end at `until`.
    pub fn last_days(until: DateTime<Utc>, days: u32) -> Result<Self> {
        if days == 0 {
            bail!("activity window must cover at least one day");
        }

        if days > MAX_WINDOW_DAYS {
            bail!("activity window cannot cover more than {MAX_WINDOW_DAYS} days, got {days}");
        }

        let Some(since) = until.checked_sub_signed(Duration::days(i64::from(days))) else {
            bail!("activity window of {days} days before {until} reaches outside the representable time range");
        };

        Self::new(since, until)
    }

    #[must_use]
    pub fn length(&self) -> Duration {
        self.until - self.since
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "window lengths are far below f64 precision limits")]
    pub fn elapsed_days(&self) -> f64 {
        self.length().num_seconds() as f64 / SECONDS_PER_DAY
    }

    /// The window of equal length that ends where this one starts, clamped to the earliest
    /// representable instant.
    #[must_use]
    pub fn previous(&self) -> Self {
        Self {
            since: self.since.checked_sub_signed(self.length()).unwrap_or(DateTime::<Utc>::MIN_UTC),
            until: self.since,
        }
    }

    /// The earliest instant collection needs to reach to compare this window with the previous one.
    #[must_use]
    pub fn collection_start(&self) -> DateTime<Utc> {
        self.previous().since
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.since && ts < self.until
    }

    #[must_use]
    pub fn contains_opt(&self, ts: Option<DateTime<Utc>>) -> bool {
        ts.is_some_and(|ts| self.contains(ts))
    }
}
