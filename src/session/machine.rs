use crate::{
    error::{SurveyError, invalid_response, question_mismatch},
    session::types::{QuestionType, Session, SessionStatus, Stage},
    types::unix_millis_now,
};

/// What the machine moved to after a successful non-conjoint submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(Stage),
    Complete,
}

impl Session {
    /// Drives one transition of the fixed question sequence. `info`
    /// questions advance on acknowledgment; `text`/`choice` answers are
    /// validated, normalized, and recorded under the question id. A
    /// submission for the wrong question or of the wrong type fails with
    /// `QuestionMismatch` and leaves the session untouched.
    pub fn submit_answer(
        &mut self,
        question_id: &str,
        question_type: QuestionType,
        value: &str,
    ) -> Result<Advance, SurveyError> {
        match self.stage {
            Stage::ConjointRound(round) => {
                return Err(question_mismatch(format!(
                    "conjoint round {} is pending; submit a choice instead of an answer",
                    round
                )));
            }
            Stage::Completion => {
                return Err(question_mismatch("session is already complete"));
            }
            _ => {}
        }

        let pending = self.stage.question();
        if question_id != pending.id {
            return Err(question_mismatch(format!(
                "expected answer for question '{}', got '{}'",
                pending.id, question_id
            )));
        }
        if question_type != pending.kind {
            return Err(question_mismatch(format!(
                "question '{}' expects a {:?} submission",
                pending.id, pending.kind
            )));
        }

        match pending.kind {
            QuestionType::Info => {}
            QuestionType::Text | QuestionType::Choice => {
                validate_answer(pending.id, value)?;
                let normalized = normalize_answer(pending.id, value);
                self.responses.insert(pending.id.to_string(), normalized);
            }
            QuestionType::Conjoint => {
                // Unreachable: conjoint stages are rejected above.
                return Err(question_mismatch("conjoint questions take choices"));
            }
        }

        self.stage = match self.stage {
            Stage::Welcome => Stage::Name,
            Stage::Name => Stage::Email,
            Stage::Email => Stage::ZipCode,
            Stage::ZipCode => Stage::IntroConjoint,
            Stage::IntroConjoint => {
                self.current_round = 1;
                Stage::ConjointRound(1)
            }
            Stage::ConjointRound(_) | Stage::Completion => self.stage,
        };

        Ok(Advance::NextQuestion(self.stage))
    }

    /// Moves past a committed conjoint round. `current_round` only ever
    /// increases by one here, and `Completion` is reached exactly when the
    /// final round has committed.
    pub fn advance_round(&mut self) -> Advance {
        self.current_round = self.current_round.saturating_add(1);
        if self.current_round > self.total_rounds {
            self.stage = Stage::Completion;
            self.status = SessionStatus::Completed;
            self.completed_at_unix_ms = Some(unix_millis_now());
            Advance::Complete
        } else {
            self.stage = Stage::ConjointRound(self.current_round);
            Advance::NextQuestion(self.stage)
        }
    }

    /// Stamp the first time a round was shown; later calls keep the
    /// original instant so reloads stay idempotent.
    pub fn mark_round_shown(&mut self, round_number: u32) {
        self.rounds_shown_at
            .entry(round_number)
            .or_insert_with(unix_millis_now);
    }
}

pub fn validate_answer(question_id: &str, raw: &str) -> Result<(), SurveyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_response("response cannot be empty"));
    }

    match question_id {
        "email" => {
            if !trimmed.contains('@') || !trimmed.contains('.') {
                return Err(invalid_response("please enter a valid email address"));
            }
        }
        "zip_code" => {
            let digits = trimmed.chars().filter(char::is_ascii_digit).count();
            if digits < 5 {
                return Err(invalid_response("please enter a valid zip code"));
            }
        }
        "name" => {
            if trimmed.len() < 2 {
                return Err(invalid_response("please enter your name"));
            }
        }
        _ => {}
    }

    Ok(())
}

pub fn normalize_answer(question_id: &str, raw: &str) -> String {
    let trimmed = raw.trim();
    match question_id {
        "email" => trimmed.to_lowercase(),
        "zip_code" => trimmed
            .chars()
            .filter(char::is_ascii_digit)
            .take(5)
            .collect(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Advance, normalize_answer, validate_answer};
    use crate::{
        error::SurveyErrorKind,
        session::types::{QuestionType, Session, Stage},
        types::SessionId,
    };

    fn fresh_session() -> Session {
        Session::new(SessionId::new_v4(), "seed".to_string(), 2)
    }

    #[test]
    fn intro_questions_advance_in_fixed_order() {
        let mut session = fresh_session();

        session
            .submit_answer("welcome", QuestionType::Info, "")
            .expect("welcome acknowledgment should advance");
        assert_eq!(session.stage, Stage::Name);

        session
            .submit_answer("name", QuestionType::Text, "Ada Lovelace")
            .expect("name should advance");
        session
            .submit_answer("email", QuestionType::Text, "Ada@Example.COM")
            .expect("email should advance");
        session
            .submit_answer("zip_code", QuestionType::Text, "02139-1234")
            .expect("zip should advance");
        assert_eq!(session.stage, Stage::IntroConjoint);

        let advance = session
            .submit_answer("intro_conjoint", QuestionType::Info, "")
            .expect("intro acknowledgment should advance");
        assert_eq!(advance, Advance::NextQuestion(Stage::ConjointRound(1)));
        assert_eq!(session.current_round, 1);

        assert_eq!(session.responses["name"], "Ada Lovelace");
        assert_eq!(session.responses["email"], "ada@example.com");
        assert_eq!(session.responses["zip_code"], "02139");
    }

    #[test]
    fn wrong_question_id_or_type_is_a_mismatch() {
        let mut session = fresh_session();

        let err = session
            .submit_answer("name", QuestionType::Text, "Ada")
            .expect_err("answering ahead of the script must fail");
        assert_eq!(err.kind, SurveyErrorKind::QuestionMismatch);
        assert_eq!(session.stage, Stage::Welcome);

        let err = session
            .submit_answer("welcome", QuestionType::Text, "hello")
            .expect_err("wrong type must fail");
        assert_eq!(err.kind, SurveyErrorKind::QuestionMismatch);
        assert_eq!(session.stage, Stage::Welcome);
    }

    #[test]
    fn answer_validation_matches_question_rules() {
        assert!(validate_answer("email", "nope").is_err());
        assert!(validate_answer("email", "a@b.co").is_ok());
        assert!(validate_answer("zip_code", "123").is_err());
        assert!(validate_answer("zip_code", "02139").is_ok());
        assert!(validate_answer("name", "A").is_err());
        assert!(validate_answer("name", "  ").is_err());

        assert_eq!(normalize_answer("zip_code", " 02139-1234 "), "02139");
        assert_eq!(normalize_answer("email", " X@Y.Z "), "x@y.z");
    }

    #[test]
    fn advance_round_reaches_completion_after_final_round() {
        let mut session = fresh_session();
        session.stage = Stage::ConjointRound(1);
        session.current_round = 1;

        assert_eq!(
            session.advance_round(),
            Advance::NextQuestion(Stage::ConjointRound(2))
        );
        assert_eq!(session.advance_round(), Advance::Complete);
        assert!(session.stage.is_terminal());
        assert!(session.completed_at_unix_ms.is_some());
    }
}
