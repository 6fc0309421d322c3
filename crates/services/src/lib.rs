#![forbid(unsafe_code)]

pub mod error;
pub mod ledger;
pub mod provider;
pub mod sessions;

pub use trivia_core::Clock;

pub use error::{ControllerError, LedgerError, ProviderError};
pub use ledger::{RecordedResult, ScoreLedger};
pub use provider::{
    GeneratedQuestionProvider, GeneratorConfig, QuestionBatchProvider, StaticQuestionBank,
};
pub use sessions::{
    DEFAULT_QUESTION_COUNT, FinalResult, NextOutcome, SETTLE_DELAY, SessionController,
    SessionMachine, SessionPhase, SessionSnapshot, TransitionOutcome,
};
