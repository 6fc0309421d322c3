mod difficulty;
mod ids;
mod item;
mod leaderboard;
mod player;
mod session;

pub use difficulty::{Difficulty, DifficultyParseError};
pub use ids::{EmptyIdError, QuestionId};
pub use item::{OPTION_COUNT, TriviaItem, TriviaItemDraft, TriviaItemError};
pub use leaderboard::{Leaderboard, ScoreEntry};
pub use player::{PlayerName, PlayerNameError};
pub use session::{
    AnswerOutcome, AnswerRecord, BatchRejection, BatchStatus, Direction, LoadTicket,
    PendingTransition, Session, TransitionStart,
};
