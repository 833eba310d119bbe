use std::fmt;

use serde::Serialize;

/// Stable machine-readable failure kinds surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyErrorKind {
    SessionNotFound,
    QuestionMismatch,
    RoundOutOfSequence,
    ConflictingChoice,
    InvalidProfile,
    CatalogMismatch,
    InvalidResponseTime,
    InvalidResponse,
    InvalidRequest,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyError {
    pub kind: SurveyErrorKind,
    pub message: String,
}

impl SurveyError {
    pub fn new(kind: SurveyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SurveyError {}

pub fn session_not_found(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::SessionNotFound, message)
}

pub fn question_mismatch(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::QuestionMismatch, message)
}

pub fn round_out_of_sequence(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::RoundOutOfSequence, message)
}

pub fn conflicting_choice(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::ConflictingChoice, message)
}

pub fn invalid_profile(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::InvalidProfile, message)
}

pub fn catalog_mismatch(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::CatalogMismatch, message)
}

pub fn invalid_response_time(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::InvalidResponseTime, message)
}

pub fn invalid_response(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::InvalidResponse, message)
}

pub fn invalid_request(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::InvalidRequest, message)
}

pub fn internal_error(message: impl Into<String>) -> SurveyError {
    SurveyError::new(SurveyErrorKind::Internal, message)
}
