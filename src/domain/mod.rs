pub mod message;
pub mod types;

pub use message::{Message, MessageId};
pub use types::{
    ActionKind, ActionOutcome, MessageOutcome, Probabilities, RunSummary, Verdict, VerdictLabel,
};
