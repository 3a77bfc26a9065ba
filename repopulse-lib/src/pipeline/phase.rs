use serde::{Deserialize, Serialize};
use strum::Display;

/// The phases of a run, in order. [`Phase::Error`] is reachable from every phase and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Phase {
    Detect,
    Collect,
    Analyze,
    Done,
    Error,
}
