use std::sync::Arc;

use conjointd::{
    catalog::AttributeCatalog,
    design::Strategy,
    engine::{ChoiceOutcome, SurveyEngine},
    error::SurveyErrorKind,
    export::{analysis_rows, rows_to_csv},
    ledger::Choice,
    session::{QuestionType, Stage},
    types::SessionId,
};

fn engine(strategy: Strategy, total_rounds: u32) -> SurveyEngine {
    SurveyEngine::new(
        Arc::new(AttributeCatalog::default_job_catalog()),
        strategy,
        total_rounds,
    )
}

/// Walks the intro questions up to the first conjoint round.
fn reach_conjoint(engine: &SurveyEngine, session_id: SessionId) {
    engine
        .respond(session_id, "welcome", QuestionType::Info, "")
        .expect("welcome acknowledgment should advance");
    engine
        .respond(session_id, "name", QuestionType::Text, "Ada Lovelace")
        .expect("name should advance");
    engine
        .respond(session_id, "email", QuestionType::Text, "ada@example.com")
        .expect("email should advance");
    engine
        .respond(session_id, "zip_code", QuestionType::Text, "02139")
        .expect("zip code should advance");
    let question = engine
        .respond(session_id, "intro_conjoint", QuestionType::Info, "")
        .expect("intro acknowledgment should advance");
    assert_eq!(question.id, "conjoint");
    assert_eq!(question.current_round, Some(1));
}

#[test]
fn given_seed_abc123_when_running_two_rounds_then_the_full_scenario_holds() {
    let engine = engine(Strategy::Balanced, 2);
    let started = engine
        .start_session_with_seed("abc123")
        .expect("session should start");
    assert_eq!(started.total_conjoint_rounds, 2);
    assert_eq!(started.question.id, "welcome");
    let session_id = started.session_id;

    reach_conjoint(&engine, session_id);

    // Requesting round 1 twice must yield the identical card pair.
    let first_view = engine
        .get_round(session_id, 1)
        .expect("round 1 should be available");
    let second_view = engine
        .get_round(session_id, 1)
        .expect("round 1 stays available");
    assert_eq!(first_view, second_view);

    let outcome = engine
        .submit_choice(session_id, 1, Choice::A, 850)
        .expect("choice should commit");
    assert_eq!(
        outcome,
        ChoiceOutcome {
            conjoint_complete: false,
            next_round: Some(2),
            completion_message: None,
        }
    );

    // Resubmitting the same choice is an idempotent replay: same success,
    // no new record.
    let replay = engine
        .submit_choice(session_id, 1, Choice::A, 9999)
        .expect("replay should commit");
    assert_eq!(replay, outcome);
    let results = engine.get_results(session_id).expect("results readable");
    assert_eq!(results.choices.len(), 1);
    assert_eq!(results.choices[0].response_time_ms, 850);

    // A different choice for the committed round is a conflict.
    let err = engine
        .submit_choice(session_id, 1, Choice::B, 900)
        .expect_err("conflicting replay must fail");
    assert_eq!(err.kind, SurveyErrorKind::ConflictingChoice);

    let outcome = engine
        .submit_choice(session_id, 2, Choice::B, 1200)
        .expect("final choice should commit");
    assert_eq!(
        outcome,
        ChoiceOutcome {
            conjoint_complete: true,
            next_round: None,
            completion_message: Some(Stage::Completion.question().message),
        }
    );

    let results = engine.get_results(session_id).expect("results readable");
    assert_eq!(results.choices.len(), 2);
    assert_eq!(results.responses["name"], "Ada Lovelace");

    let err = engine
        .respond(session_id, "welcome", QuestionType::Info, "")
        .expect_err("completed sessions take no more answers");
    assert_eq!(err.kind, SurveyErrorKind::QuestionMismatch);
}

#[test]
fn given_ten_rounds_when_played_in_order_then_progress_is_strictly_monotonic() {
    let engine = engine(Strategy::Seeded, 10);
    let started = engine
        .start_session_with_seed("monotonic")
        .expect("session should start");
    let session_id = started.session_id;
    reach_conjoint(&engine, session_id);

    for round in 1..=10u32 {
        // Skipping ahead is rejected and leaves the round unchanged.
        let err = engine
            .submit_choice(session_id, round + 1, Choice::A, 10)
            .expect_err("future rounds must be rejected");
        assert_eq!(err.kind, SurveyErrorKind::RoundOutOfSequence);

        engine
            .get_round(session_id, round)
            .expect("current round should be available");
        let outcome = engine
            .submit_choice(session_id, round, Choice::B, 10)
            .expect("choice should commit");
        if round < 10 {
            assert_eq!(outcome.next_round, Some(round + 1));
            assert!(!outcome.conjoint_complete);
        } else {
            assert!(outcome.conjoint_complete);
            assert!(outcome.completion_message.is_some());
        }
    }

    // Rounds beyond the configured total never exist.
    let err = engine
        .get_round(session_id, 11)
        .expect_err("round 11 must not exist");
    assert_eq!(err.kind, SurveyErrorKind::RoundOutOfSequence);
}

#[test]
fn given_the_intro_stage_when_touching_rounds_then_out_of_sequence_is_reported() {
    let engine = engine(Strategy::Balanced, 2);
    let started = engine
        .start_session_with_seed("early")
        .expect("session should start");
    let session_id = started.session_id;

    let err = engine
        .get_round(session_id, 1)
        .expect_err("conjoint has not started yet");
    assert_eq!(err.kind, SurveyErrorKind::RoundOutOfSequence);

    let err = engine
        .submit_choice(session_id, 1, Choice::A, 100)
        .expect_err("no choice can commit before the conjoint stage");
    assert_eq!(err.kind, SurveyErrorKind::RoundOutOfSequence);
}

#[test]
fn given_an_unknown_session_when_calling_any_operation_then_session_not_found() {
    let engine = engine(Strategy::Balanced, 2);
    let missing = SessionId::new_v4();

    for err in [
        engine
            .respond(missing, "welcome", QuestionType::Info, "")
            .expect_err("respond must fail"),
        engine.get_round(missing, 1).expect_err("get_round must fail"),
        engine
            .submit_choice(missing, 1, Choice::A, 100)
            .expect_err("submit_choice must fail"),
        engine.get_results(missing).expect_err("get_results must fail"),
    ] {
        assert_eq!(err.kind, SurveyErrorKind::SessionNotFound);
    }
}

#[test]
fn given_invalid_answers_when_responding_then_the_stage_does_not_move() {
    let engine = engine(Strategy::Balanced, 2);
    let started = engine
        .start_session_with_seed("validation")
        .expect("session should start");
    let session_id = started.session_id;

    engine
        .respond(session_id, "welcome", QuestionType::Info, "")
        .expect("welcome acknowledgment should advance");

    let err = engine
        .respond(session_id, "name", QuestionType::Text, " ")
        .expect_err("blank names are invalid");
    assert_eq!(err.kind, SurveyErrorKind::InvalidResponse);

    // Still on the name question.
    let question = engine
        .respond(session_id, "name", QuestionType::Text, "Ada")
        .expect("valid name should advance");
    assert_eq!(question.id, "email");

    let err = engine
        .respond(session_id, "email", QuestionType::Text, "not-an-email")
        .expect_err("malformed email is invalid");
    assert_eq!(err.kind, SurveyErrorKind::InvalidResponse);
}

#[test]
fn given_a_finished_session_when_exporting_then_rows_carry_choice_and_levels() {
    let engine = engine(Strategy::Balanced, 2);
    let started = engine
        .start_session_with_seed("export")
        .expect("session should start");
    let session_id = started.session_id;
    reach_conjoint(&engine, session_id);

    engine
        .submit_choice(session_id, 1, Choice::A, 410)
        .expect("choice should commit");
    engine
        .submit_choice(session_id, 2, Choice::B, 520)
        .expect("choice should commit");

    let results = engine.get_results(session_id).expect("results readable");
    let rows = analysis_rows(&results);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["round_number"], 1);
    assert_eq!(rows[0]["chose_a"], 1);
    assert_eq!(rows[1]["chose_a"], 0);
    assert!(rows[0].get("a_company_size").is_some());
    assert!(rows[0].get("b_location").is_some());

    let csv = rows_to_csv(&rows);
    let header = csv.lines().next().expect("csv has a header");
    assert!(header.contains("chose_a"));
    assert!(header.contains("a_company_size"));
    assert_eq!(csv.lines().count(), 3);
}
