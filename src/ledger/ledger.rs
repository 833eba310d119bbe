use std::collections::BTreeMap;

use crate::{
    error::{SurveyError, conflicting_choice, invalid_response_time},
    ledger::types::{Choice, ChoiceEvent, RecordResult},
    types::{SessionId, unix_millis_now},
};

/// Append-only store of choice events, at most one per
/// `(session_id, round_number)`.
///
/// The check for an existing event and the insert happen in one step on the
/// map entry; callers serialize access (the engine holds the ledger behind
/// its state lock), so two racing submissions can never both observe "no
/// event" and both insert.
#[derive(Debug, Default)]
pub struct ChoiceLedger {
    events: BTreeMap<(SessionId, u32), ChoiceEvent>,
}

impl ChoiceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        session_id: SessionId,
        round_number: u32,
        choice: Choice,
        response_time_ms: i64,
    ) -> Result<RecordResult, SurveyError> {
        if response_time_ms < 0 {
            return Err(invalid_response_time(format!(
                "response_time_ms must be non-negative, got {}",
                response_time_ms
            )));
        }

        match self.events.entry((session_id, round_number)) {
            std::collections::btree_map::Entry::Occupied(existing) => {
                let existing = existing.get();
                if existing.choice == choice {
                    // Client retry after a dropped acknowledgment; the
                    // original record stays authoritative.
                    Ok(RecordResult::Committed { replayed: true })
                } else {
                    Err(conflicting_choice(format!(
                        "round {} of session {} already recorded choice {}",
                        round_number,
                        session_id,
                        existing.choice.as_str()
                    )))
                }
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(ChoiceEvent {
                    session_id,
                    round_number,
                    choice,
                    response_time_ms,
                    recorded_at_unix_ms: unix_millis_now(),
                });
                Ok(RecordResult::Committed { replayed: false })
            }
        }
    }

    pub fn event(&self, session_id: SessionId, round_number: u32) -> Option<&ChoiceEvent> {
        self.events.get(&(session_id, round_number))
    }

    /// All committed events for a session, in round order.
    pub fn events_for(&self, session_id: SessionId) -> Vec<&ChoiceEvent> {
        self.events
            .range((session_id, 0)..=(session_id, u32::MAX))
            .map(|(_, event)| event)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ChoiceLedger;
    use crate::{
        error::SurveyErrorKind,
        ledger::types::{Choice, RecordResult},
        types::SessionId,
    };

    #[test]
    fn replay_with_same_choice_keeps_original_latency() {
        let session = SessionId::new_v4();
        let mut ledger = ChoiceLedger::new();

        let first = ledger
            .record(session, 3, Choice::A, 1200)
            .expect("first record should commit");
        assert_eq!(first, RecordResult::Committed { replayed: false });

        let replay = ledger
            .record(session, 3, Choice::A, 1700)
            .expect("replay should commit");
        assert_eq!(replay, RecordResult::Committed { replayed: true });

        let stored = ledger.event(session, 3).expect("event exists");
        assert_eq!(stored.response_time_ms, 1200);
    }

    #[test]
    fn conflicting_choice_is_rejected() {
        let session = SessionId::new_v4();
        let mut ledger = ChoiceLedger::new();
        ledger
            .record(session, 3, Choice::A, 1200)
            .expect("first record should commit");

        let err = ledger
            .record(session, 3, Choice::B, 900)
            .expect_err("conflicting replay must fail");
        assert_eq!(err.kind, SurveyErrorKind::ConflictingChoice);
        assert_eq!(
            ledger.event(session, 3).expect("event exists").choice,
            Choice::A
        );
    }

    #[test]
    fn negative_latency_is_rejected_before_any_write() {
        let session = SessionId::new_v4();
        let mut ledger = ChoiceLedger::new();
        let err = ledger
            .record(session, 1, Choice::A, -1)
            .expect_err("negative latency must fail");
        assert_eq!(err.kind, SurveyErrorKind::InvalidResponseTime);
        assert!(ledger.is_empty());
    }

    #[test]
    fn events_for_only_returns_the_requested_session() {
        let session_one = SessionId::new_v4();
        let session_two = SessionId::new_v4();
        let mut ledger = ChoiceLedger::new();
        ledger
            .record(session_one, 1, Choice::A, 10)
            .expect("record should commit");
        ledger
            .record(session_one, 2, Choice::B, 20)
            .expect("record should commit");
        ledger
            .record(session_two, 1, Choice::B, 30)
            .expect("record should commit");

        let events = ledger.events_for(session_one);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.session_id == session_one));
        assert_eq!(events[0].round_number, 1);
        assert_eq!(events[1].round_number, 2);
    }
}
