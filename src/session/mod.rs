pub mod machine;
pub mod types;

pub use machine::{Advance, normalize_answer, validate_answer};
pub use types::{QuestionSpec, QuestionType, Session, SessionStatus, Stage};
