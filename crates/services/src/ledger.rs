use std::fmt;
use std::sync::Arc;

use storage::LeaderboardSlot;
use storage::repository::{KeyValueStore, StorageError};
use tracing::{debug, info, warn};
use trivia_core::model::{Leaderboard, PlayerName, ScoreEntry};

use crate::Clock;
use crate::error::LedgerError;

/// Outcome of recording a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResult {
    pub entry: ScoreEntry,
    /// Rank of `entry` on the updated board, `None` if it did not make the cut.
    pub position: Option<usize>,
    pub leaderboard: Leaderboard,
}

/// Persisted top-score ranking.
///
/// The board is read once when the ledger is created and written through on
/// every recorded result.
pub struct ScoreLedger {
    clock: Clock,
    slot: LeaderboardSlot,
    board: Leaderboard,
}

impl ScoreLedger {
    /// Load the persisted leaderboard.
    ///
    /// Never fails: a missing slot is an empty board, and unreadable or
    /// malformed data is logged and replaced by an empty board.
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        let slot = LeaderboardSlot::new(store);
        let board = match slot.load().await {
            Ok(board) => {
                debug!(entries = board.len(), "leaderboard loaded");
                board
            }
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, key = slot.key(), "stored leaderboard is malformed; starting empty");
                Leaderboard::new()
            }
            Err(err) => {
                warn!(error = %err, "could not read leaderboard; starting empty");
                Leaderboard::new()
            }
        };
        Self { clock, slot, board }
    }

    #[must_use]
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.board
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Merge a finished session into the leaderboard and persist it.
    ///
    /// A missing name is recorded as [`PlayerName::PLACEHOLDER`]. The
    /// in-memory board only changes once the write has succeeded.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if the updated board cannot be written.
    pub async fn record_result(
        &mut self,
        name: Option<&PlayerName>,
        score: u32,
    ) -> Result<RecordedResult, LedgerError> {
        let name = name.cloned().unwrap_or_else(PlayerName::anonymous);
        let entry = ScoreEntry::new(&name, score, self.clock.now());
        let (updated, position) = self.board.insert(entry.clone());

        self.slot.save(&updated).await?;
        self.board = updated;

        info!(player = %name, score, ?position, "result recorded");
        Ok(RecordedResult {
            entry,
            position,
            leaderboard: self.board.clone(),
        })
    }
}

impl fmt::Debug for ScoreLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreLedger")
            .field("clock", &self.clock)
            .field("key", &self.slot.key())
            .field("entries", &self.board.len())
            .finish_non_exhaustive()
    }
}
