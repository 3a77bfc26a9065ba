use super::Phase;
use serde::{Deserialize, Serialize};
use strum::Display;

const LOG_TARGET: &str = "  pipeline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventOutcome {
    Ok,
    Degraded,
    Failed,
}

/// One recorded step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub phase: Phase,
    pub event: String,
    pub outcome: EventOutcome,
    pub detail: String,
}

/// The ordered record of everything a run did, shipped with its result.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Vec<RunLogEntry>,
}

impl RunLog {
    pub fn record(&mut self, phase: Phase, event: &str, outcome: EventOutcome, detail: impl Into<String>) {
        let detail = detail.into();
        match outcome {
            EventOutcome::Ok => log::info!(target: LOG_TARGET, "{phase}: {event}: {detail}"),
            EventOutcome::Degraded | EventOutcome::Failed => log::warn!(target: LOG_TARGET, "{phase}: {event} ({outcome}): {detail}"),
        }

        self.entries.push(RunLogEntry {
            phase,
            event: event.to_string(),
            outcome,
            detail,
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[RunLogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<RunLogEntry> {
        self.entries
    }
}
