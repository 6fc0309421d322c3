use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::model::player::PlayerName;

/// One finished session on the leaderboard.
///
/// Serialized as `{ "name", "score", "date" }` with `date` in epoch milliseconds.
/// `created_at` is held at millisecond precision so a stored entry reads back equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    #[serde(rename = "date", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl ScoreEntry {
    #[must_use]
    pub fn new(name: &PlayerName, score: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.as_str().to_owned(),
            score,
            created_at: created_at.trunc_subsecs(3),
        }
    }
}

/// Best results across sessions, highest score first.
///
/// Holds at most [`Leaderboard::CAPACITY`] entries. Equal scores keep the
/// order in which they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub const CAPACITY: usize = 5;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a leaderboard from persisted entries, re-establishing ordering and capacity.
    #[must_use]
    pub fn from_entries(mut entries: Vec<ScoreEntry>) -> Self {
        rank(&mut entries);
        Self { entries }
    }

    /// Returns a new leaderboard with `entry` merged in.
    ///
    /// On a tie the earlier result stays ahead. The entry is dropped if it
    /// does not make the cut.
    #[must_use]
    pub fn with_entry(&self, entry: ScoreEntry) -> Self {
        self.insert(entry).0
    }

    /// Like [`Leaderboard::with_entry`], also returning the row the entry
    /// landed on, or `None` if it did not make the board.
    #[must_use]
    pub fn insert(&self, entry: ScoreEntry) -> (Self, Option<usize>) {
        // Entries are ranked, so everything scoring at least as much stays ahead.
        let row = self.entries.partition_point(|e| e.score >= entry.score);
        if row >= Self::CAPACITY {
            return (self.clone(), None);
        }
        let mut entries = self.entries.clone();
        entries.insert(row, entry);
        entries.truncate(Self::CAPACITY);
        (Self { entries }, Some(row))
    }

    #[must_use]
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn best(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }
}

fn rank(entries: &mut Vec<ScoreEntry>) {
    // `sort_by` is stable: ties keep insertion order.
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(Leaderboard::CAPACITY);
}
