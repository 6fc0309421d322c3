use async_trait::async_trait;
use rand::seq::SliceRandom;
use trivia_core::model::{TriviaItem, TriviaItemDraft};

use super::{QuestionBatchProvider, validate_drafts};
use crate::error::ProviderError;

/// Fixed pool of questions; each batch is a random draw from it.
#[derive(Debug, Clone)]
pub struct StaticQuestionBank {
    items: Vec<TriviaItem>,
    shuffle: bool,
}

impl StaticQuestionBank {
    #[must_use]
    pub fn new(items: Vec<TriviaItem>) -> Self {
        Self {
            items,
            shuffle: true,
        }
    }

    /// Parse a JSON array of question drafts.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Malformed` for invalid JSON and
    /// `ProviderError::InvalidItem` for the first question that fails validation.
    pub fn from_json(raw: &str) -> Result<Self, ProviderError> {
        let drafts: Vec<TriviaItemDraft> = serde_json::from_str(raw)?;
        Ok(Self::new(validate_drafts(drafts)?))
    }

    /// Keep bank order instead of drawing at random. Useful for deterministic tests.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl QuestionBatchProvider for StaticQuestionBank {
    async fn request_batch(&self, count: usize) -> Result<Vec<TriviaItem>, ProviderError> {
        if count == 0 {
            return Err(ProviderError::InvalidCount);
        }
        if self.items.is_empty() {
            return Err(ProviderError::EmptyBatch);
        }

        let mut batch = self.items.clone();
        if self.shuffle {
            batch.shuffle(&mut rand::rng());
        }
        batch.truncate(count);
        Ok(batch)
    }
}
