//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use trivia_core::model::{PlayerNameError, TriviaItemError};

use crate::sessions::SessionPhase;

/// Errors emitted by question batch providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("question generator is not configured")]
    Disabled,
    #[error("question count must be greater than zero")]
    InvalidCount,
    #[error("question source returned no questions")]
    EmptyBatch,
    #[error("question source returned an empty response")]
    EmptyResponse,
    #[error("question {index} is invalid: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: TriviaItemError,
    },
    #[error("malformed question payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("question request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ScoreLedger`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error(transparent)]
    InvalidName(#[from] PlayerNameError),
    #[error("not allowed in {actual:?} phase (expected {expected:?})")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("the question batch did not fail; nothing to retry")]
    NothingToRetry,
}
