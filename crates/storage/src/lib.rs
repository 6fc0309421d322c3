#![forbid(unsafe_code)]

pub mod leaderboard;
pub mod repository;
pub mod sqlite;

pub use leaderboard::{LEADERBOARD_KEY, LeaderboardSlot};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
