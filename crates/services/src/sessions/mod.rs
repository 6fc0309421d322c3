mod controller;
mod machine;

// Public API of the session subsystem.
pub use controller::{
    DEFAULT_QUESTION_COUNT, FinalResult, NextOutcome, SessionController, SessionPhase,
};
pub use machine::{
    SETTLE_DELAY, ScheduledTransition, SessionMachine, SessionSnapshot, TransitionOutcome,
};
