use serde::{Deserialize, Serialize};

use crate::types::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
        }
    }
}

/// A committed A/B decision. Write-once: after commit no field ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceEvent {
    pub session_id: SessionId,
    pub round_number: u32,
    pub choice: Choice,
    pub response_time_ms: i64,
    pub recorded_at_unix_ms: i64,
}

/// Outcome of a record attempt that did not fail. `replayed` marks the
/// idempotent case where an identical event was already committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordResult {
    Committed { replayed: bool },
}
