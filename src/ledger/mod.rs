pub mod ledger;
pub mod types;

pub use ledger::ChoiceLedger;
pub use types::{Choice, ChoiceEvent, RecordResult};
