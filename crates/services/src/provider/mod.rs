//! Question Batch Provider contract and the bundled implementations.

mod bank;
mod generated;

use async_trait::async_trait;
use trivia_core::model::{TriviaItem, TriviaItemDraft};

use crate::error::ProviderError;

pub use bank::StaticQuestionBank;
pub use generated::{GeneratedQuestionProvider, GeneratorConfig};

/// Source of question batches for a session.
///
/// Implementations return items with distinct ids. An empty batch and a
/// failure are handled the same way by the session.
#[async_trait]
pub trait QuestionBatchProvider: Send + Sync {
    /// Request up to `count` questions.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when no usable batch can be produced.
    async fn request_batch(&self, count: usize) -> Result<Vec<TriviaItem>, ProviderError>;
}

/// Validate a list of drafts, failing on the first invalid one.
pub(crate) fn validate_drafts(
    drafts: Vec<TriviaItemDraft>,
) -> Result<Vec<TriviaItem>, ProviderError> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .validate()
                .map_err(|source| ProviderError::InvalidItem { index, source })
        })
        .collect()
}
