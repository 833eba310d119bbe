use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    catalog::{AttributeCatalog, Profile},
    design::{self, CardView, Strategy},
    error::{SurveyError, internal_error, round_out_of_sequence, session_not_found},
    ledger::{Choice, ChoiceLedger, RecordResult},
    session::{QuestionType, Session, SessionStatus, Stage},
    types::SessionId,
};

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: &'static str,
    pub question_type: QuestionType,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<u32>,
    pub total_rounds: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub session_seed: String,
    pub total_conjoint_rounds: u32,
    pub question: QuestionView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundView {
    pub round_number: u32,
    pub total_rounds: u32,
    pub card_a: CardView,
    pub card_b: CardView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOutcome {
    pub conjoint_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_round: Option<u32>,
    /// Closing message of the survey, present once the final round commits
    /// (and on idempotent replays of it).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceRecord {
    pub round_number: u32,
    pub choice: Choice,
    pub response_time_ms: i64,
    pub recorded_at_unix_ms: i64,
    pub profile_a: Profile,
    pub profile_b: Profile,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResults {
    pub session_id: SessionId,
    pub session_seed: String,
    pub status: SessionStatus,
    pub total_rounds: u32,
    pub responses: BTreeMap<String, String>,
    pub choices: Vec<ChoiceRecord>,
}

#[derive(Debug, Default)]
struct EngineState {
    sessions: BTreeMap<SessionId, Session>,
    ledger: ChoiceLedger,
}

/// Facade over the survey core: sessions, the state machine, deterministic
/// round generation, and the write-once choice ledger.
///
/// The single state lock is what makes the ledger's check-and-insert atomic
/// under concurrent retries. Round generation is pure, so holding the lock
/// across it costs nothing in correctness and keeps the API synchronous.
pub struct SurveyEngine {
    catalog: Arc<AttributeCatalog>,
    strategy: Strategy,
    total_rounds: u32,
    state: Mutex<EngineState>,
}

impl SurveyEngine {
    pub fn new(catalog: Arc<AttributeCatalog>, strategy: Strategy, total_rounds: u32) -> Self {
        Self {
            catalog,
            strategy,
            total_rounds,
            state: Mutex::new(EngineState::default()),
        }
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn start_session(&self) -> Result<SessionStarted, SurveyError> {
        self.start_session_with_seed(Uuid::new_v4().to_string())
    }

    /// Seeded variant; the seed fixes every round the session will see.
    pub fn start_session_with_seed(
        &self,
        session_seed: impl Into<String>,
    ) -> Result<SessionStarted, SurveyError> {
        let session_seed = session_seed.into();
        let session_id = Uuid::new_v4();
        let session = Session::new(session_id, session_seed.clone(), self.total_rounds);
        let question = question_view_for(&session);

        let mut state = self.lock_state()?;
        state.sessions.insert(session_id, session);

        tracing::info!(
            target: "engine",
            session_id = %session_id,
            strategy = self.strategy.name(),
            total_rounds = self.total_rounds,
            "session_started"
        );

        Ok(SessionStarted {
            session_id,
            session_seed,
            total_conjoint_rounds: self.total_rounds,
            question,
        })
    }

    pub fn respond(
        &self,
        session_id: SessionId,
        question_id: &str,
        question_type: QuestionType,
        value: &str,
    ) -> Result<QuestionView, SurveyError> {
        let mut state = self.lock_state()?;
        let session = session_mut(&mut state, session_id)?;
        session.submit_answer(question_id, question_type, value)?;
        tracing::debug!(
            target: "engine",
            session_id = %session_id,
            question_id,
            stage = ?session.stage,
            "answer_recorded"
        );
        Ok(question_view_for(session))
    }

    /// Safe to call repeatedly for the same round: generation is a pure
    /// function of `(seed, round_number)`, so the cards are bit-identical
    /// on every call.
    pub fn get_round(
        &self,
        session_id: SessionId,
        round_number: u32,
    ) -> Result<RoundView, SurveyError> {
        let mut state = self.lock_state()?;
        let session = session_mut(&mut state, session_id)?;

        if session.current_round == 0 {
            return Err(round_out_of_sequence(
                "the conjoint stage has not started for this session",
            ));
        }
        if round_number == 0
            || round_number > session.total_rounds
            || round_number > session.current_round
        {
            return Err(round_out_of_sequence(format!(
                "round {} is not available; the session is on round {}",
                round_number, session.current_round
            )));
        }

        let round = design::build_round(
            &session.session_seed,
            round_number,
            &self.catalog,
            self.strategy,
        )?;
        session.mark_round_shown(round_number);

        Ok(RoundView {
            round_number,
            total_rounds: session.total_rounds,
            card_a: round.card_a,
            card_b: round.card_b,
        })
    }

    pub fn submit_choice(
        &self,
        session_id: SessionId,
        round_number: u32,
        choice: Choice,
        response_time_ms: i64,
    ) -> Result<ChoiceOutcome, SurveyError> {
        let mut state = self.lock_state()?;
        let (total_rounds, current_round, stage) = {
            let session = session_mut(&mut state, session_id)?;
            (session.total_rounds, session.current_round, session.stage)
        };
        let at_current =
            stage == Stage::ConjointRound(round_number) && round_number == current_round;
        let already_recorded = state.ledger.event(session_id, round_number).is_some();

        if !at_current && !already_recorded {
            return Err(round_out_of_sequence(format!(
                "round {} is not the session's current round ({})",
                round_number, current_round
            )));
        }

        // Atomic check-and-insert; a replay with the same choice commits
        // idempotently, a different choice conflicts and changes nothing.
        let result = state
            .ledger
            .record(session_id, round_number, choice, response_time_ms)?;
        let replayed = matches!(result, RecordResult::Committed { replayed: true });

        if at_current && !replayed {
            let session = session_mut(&mut state, session_id)?;
            session.advance_round();
            tracing::info!(
                target: "engine",
                session_id = %session_id,
                round_number,
                choice = choice.as_str(),
                response_time_ms,
                "choice_recorded"
            );
        } else {
            tracing::debug!(
                target: "engine",
                session_id = %session_id,
                round_number,
                "choice_replayed"
            );
        }

        let conjoint_complete = round_number >= total_rounds;
        Ok(ChoiceOutcome {
            conjoint_complete,
            next_round: (!conjoint_complete).then_some(round_number + 1),
            completion_message: conjoint_complete
                .then_some(Stage::Completion.question().message),
        })
    }

    /// Read-only aggregation of everything the session produced, each
    /// choice joined with its regenerated profile pair.
    pub fn get_results(&self, session_id: SessionId) -> Result<SessionResults, SurveyError> {
        let state = self.lock_state()?;
        let session = state
            .sessions
            .get(&session_id)
            .ok_or_else(|| session_not_found(format!("unknown session '{}'", session_id)))?;

        let mut choices = Vec::new();
        for event in state.ledger.events_for(session_id) {
            let round = design::build_round(
                &session.session_seed,
                event.round_number,
                &self.catalog,
                self.strategy,
            )?;
            choices.push(ChoiceRecord {
                round_number: event.round_number,
                choice: event.choice,
                response_time_ms: event.response_time_ms,
                recorded_at_unix_ms: event.recorded_at_unix_ms,
                profile_a: round.profile_a,
                profile_b: round.profile_b,
            });
        }

        Ok(SessionResults {
            session_id,
            session_seed: session.session_seed.clone(),
            status: session.status,
            total_rounds: session.total_rounds,
            responses: session.responses.clone(),
            choices,
        })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, EngineState>, SurveyError> {
        self.state
            .lock()
            .map_err(|_| internal_error("engine state lock poisoned"))
    }
}

fn session_mut(
    state: &mut EngineState,
    session_id: SessionId,
) -> Result<&mut Session, SurveyError> {
    state
        .sessions
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(format!("unknown session '{}'", session_id)))
}

fn question_view_for(session: &Session) -> QuestionView {
    let spec = session.stage.question();
    QuestionView {
        id: spec.id,
        question_type: spec.kind,
        message: spec.message,
        placeholder: spec.placeholder,
        current_round: match session.stage {
            Stage::ConjointRound(round) => Some(round),
            _ => None,
        },
        total_rounds: session.total_rounds,
    }
}
