use serde::Deserialize;
use serde_json::{Value, json};

use crate::{error::SurveyError, ledger::Choice, session::QuestionType, types::SessionId};

/// One NDJSON request line. The `type` tag selects the operation; unknown
/// types and non-object lines are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    StartSession,
    Respond {
        session_id: SessionId,
        question_id: String,
        question_type: QuestionType,
        #[serde(default)]
        value: String,
    },
    GetRound {
        session_id: SessionId,
        round_number: u32,
    },
    SubmitChoice {
        session_id: SessionId,
        round_number: u32,
        choice: Choice,
        response_time_ms: i64,
    },
    GetResults {
        session_id: SessionId,
    },
    Exit,
}

pub fn parse_client_request(line: &str) -> Result<ClientRequest, serde_json::Error> {
    serde_json::from_str(line)
}

pub fn ok_reply(payload: Value) -> String {
    json!({ "ok": payload }).to_string()
}

pub fn error_reply(err: &SurveyError) -> String {
    json!({
        "error": {
            "kind": err.kind,
            "message": err.message,
        }
    })
    .to_string()
}
