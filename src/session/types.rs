use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{SessionId, unix_millis_now};

/// Where a session currently is in the fixed survey sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Welcome,
    Name,
    Email,
    ZipCode,
    IntroConjoint,
    ConjointRound(u32),
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Info,
    Text,
    Choice,
    Conjoint,
}

/// Static description of one survey question: what comes next is pure data,
/// how it is rendered belongs to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSpec {
    pub id: &'static str,
    pub kind: QuestionType,
    pub message: &'static str,
    pub placeholder: Option<&'static str>,
}

pub const WELCOME: QuestionSpec = QuestionSpec {
    id: "welcome",
    kind: QuestionType::Info,
    message: "Hi! I'll ask you a few quick questions about the kind of roles and employers you're looking for, which should take about three minutes. Let's get started.",
    placeholder: None,
};

pub const NAME: QuestionSpec = QuestionSpec {
    id: "name",
    kind: QuestionType::Text,
    message: "Great! What's your name?",
    placeholder: Some("Enter your full name"),
};

pub const EMAIL: QuestionSpec = QuestionSpec {
    id: "email",
    kind: QuestionType::Text,
    message: "Please confirm your email address.",
    placeholder: Some("Enter your email address"),
};

pub const ZIP_CODE: QuestionSpec = QuestionSpec {
    id: "zip_code",
    kind: QuestionType::Text,
    message: "And your ZIP code?",
    placeholder: Some("Enter your ZIP code"),
};

pub const INTRO_CONJOINT: QuestionSpec = QuestionSpec {
    id: "intro_conjoint",
    kind: QuestionType::Info,
    message: "Now I'd like to understand your job preferences better. I'll show you pairs of roles and ask which one you'd rather apply to.",
    placeholder: None,
};

pub const CONJOINT: QuestionSpec = QuestionSpec {
    id: "conjoint",
    kind: QuestionType::Conjoint,
    message: "Which company would you be more likely to apply to?",
    placeholder: None,
};

pub const COMPLETION: QuestionSpec = QuestionSpec {
    id: "completion",
    kind: QuestionType::Info,
    message: "That's everything I need. Thanks for your time!",
    placeholder: None,
};

impl Stage {
    /// The question pending at this stage.
    pub fn question(&self) -> &'static QuestionSpec {
        match self {
            Stage::Welcome => &WELCOME,
            Stage::Name => &NAME,
            Stage::Email => &EMAIL,
            Stage::ZipCode => &ZIP_CODE,
            Stage::IntroConjoint => &INTRO_CONJOINT,
            Stage::ConjointRound(_) => &CONJOINT,
            Stage::Completion => &COMPLETION,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completion)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// One respondent's survey run. The seed is fixed at creation and is the
/// sole source of reproducibility for every round the session will see.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub session_seed: String,
    pub stage: Stage,
    pub status: SessionStatus,
    pub responses: BTreeMap<String, String>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub rounds_shown_at: BTreeMap<u32, i64>,
    pub started_at_unix_ms: i64,
    pub completed_at_unix_ms: Option<i64>,
}

impl Session {
    pub fn new(session_id: SessionId, session_seed: String, total_rounds: u32) -> Self {
        Self {
            session_id,
            session_seed,
            stage: Stage::Welcome,
            status: SessionStatus::Active,
            responses: BTreeMap::new(),
            current_round: 0,
            total_rounds,
            rounds_shown_at: BTreeMap::new(),
            started_at_unix_ms: unix_millis_now(),
            completed_at_unix_ms: None,
        }
    }
}
