use std::sync::Arc;

use trivia_core::model::{Leaderboard, ScoreEntry};

use crate::repository::{KeyValueStore, StorageError};

/// Slot name the leaderboard is stored under.
pub const LEADERBOARD_KEY: &str = "polyphonia_scores";

/// Reads and writes the leaderboard as a JSON array in a single slot.
#[derive(Clone)]
pub struct LeaderboardSlot {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl LeaderboardSlot {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, LEADERBOARD_KEY)
    }

    #[must_use]
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted leaderboard. An absent slot is an empty board.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the slot holds malformed data,
    /// or any error raised by the underlying store.
    pub async fn load(&self) -> Result<Leaderboard, StorageError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Leaderboard::new());
        };
        let entries: Vec<ScoreEntry> = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Leaderboard::from_entries(entries))
    }

    /// Replace the persisted leaderboard.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save(&self, board: &Leaderboard) -> Result<(), StorageError> {
        let raw = serde_json::to_string(board.entries())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.put(&self.key, &raw).await
    }
}
