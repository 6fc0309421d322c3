use tracing::{error, info, warn};
use trivia_core::model::{AnswerOutcome, BatchStatus, Leaderboard, PlayerName, ScoreEntry};

use super::machine::{SessionMachine, SessionSnapshot, TransitionOutcome};
use crate::error::ControllerError;
use crate::ledger::ScoreLedger;

/// Questions requested per session unless configured otherwise.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Top-level phase of the trivia flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Welcome,
    Playing,
    GameOver,
}

/// How a finished session landed on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResult {
    pub entry: ScoreEntry,
    pub position: Option<usize>,
    /// `false` if the leaderboard write failed and the result was not kept.
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Ignored,
    Scheduled,
    Finished(FinalResult),
}

/// Binds identity capture, the session machine and the score ledger into
/// the Welcome -> Playing -> GameOver flow.
#[derive(Debug)]
pub struct SessionController {
    phase: SessionPhase,
    player: Option<PlayerName>,
    question_count: usize,
    machine: SessionMachine,
    ledger: ScoreLedger,
    last_result: Option<FinalResult>,
}

impl SessionController {
    #[must_use]
    pub fn new(machine: SessionMachine, ledger: ScoreLedger) -> Self {
        Self {
            phase: SessionPhase::Welcome,
            player: None,
            question_count: DEFAULT_QUESTION_COUNT,
            machine,
            ledger,
            last_result: None,
        }
    }

    /// Number of questions requested per session. Zero is ignored.
    #[must_use]
    pub fn with_question_count(mut self, count: usize) -> Self {
        if count > 0 {
            self.question_count = count;
        }
        self
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<(), ControllerError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ControllerError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Capture the player's name and start playing.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::InvalidName` for a blank name (the phase stays
    /// `Welcome`) and `ControllerError::WrongPhase` outside `Welcome`.
    pub async fn start(&mut self, raw_name: &str) -> Result<BatchStatus, ControllerError> {
        self.expect_phase(SessionPhase::Welcome)?;
        let name = PlayerName::parse(raw_name)?;

        info!(player = %name, count = self.question_count, "session starting");
        self.player = Some(name);
        self.last_result = None;
        self.phase = SessionPhase::Playing;
        Ok(self.machine.start_session(self.question_count).await)
    }

    /// Request the batch again after a failed load.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::WrongPhase` outside `Playing` and
    /// `ControllerError::NothingToRetry` unless the last load failed.
    pub async fn retry(&mut self) -> Result<BatchStatus, ControllerError> {
        self.expect_phase(SessionPhase::Playing)?;
        if self.machine.status() != BatchStatus::Error {
            return Err(ControllerError::NothingToRetry);
        }
        info!(count = self.question_count, "retrying question batch");
        Ok(self.machine.start_session(self.question_count).await)
    }

    /// # Errors
    ///
    /// Returns `ControllerError::WrongPhase` outside `Playing`.
    pub fn answer(&mut self, option: &str) -> Result<AnswerOutcome, ControllerError> {
        self.expect_phase(SessionPhase::Playing)?;
        Ok(self.machine.submit_answer(option))
    }

    /// Move on; after the last question, record the result and end the session.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::WrongPhase` outside `Playing`.
    pub async fn next(&mut self) -> Result<NextOutcome, ControllerError> {
        self.expect_phase(SessionPhase::Playing)?;
        match self.machine.advance() {
            TransitionOutcome::Ignored => Ok(NextOutcome::Ignored),
            TransitionOutcome::Scheduled => Ok(NextOutcome::Scheduled),
            TransitionOutcome::Completed => Ok(NextOutcome::Finished(self.finish().await)),
        }
    }

    /// # Errors
    ///
    /// Returns `ControllerError::WrongPhase` outside `Playing`.
    pub fn previous(&mut self) -> Result<TransitionOutcome, ControllerError> {
        self.expect_phase(SessionPhase::Playing)?;
        Ok(self.machine.retreat())
    }

    async fn finish(&mut self) -> FinalResult {
        let score = self.machine.score();
        let result = match self.ledger.record_result(self.player.as_ref(), score).await {
            Ok(recorded) => FinalResult {
                entry: recorded.entry,
                position: recorded.position,
                saved: true,
            },
            Err(err) => {
                error!(error = %err, score, "could not save result; leaderboard unchanged");
                let name = self.player.clone().unwrap_or_else(PlayerName::anonymous);
                FinalResult {
                    entry: ScoreEntry::new(&name, score, self.ledger.clock().now()),
                    position: None,
                    saved: false,
                }
            }
        };

        info!(score, position = ?result.position, "session finished");
        self.phase = SessionPhase::GameOver;
        self.last_result = Some(result.clone());
        result
    }

    /// Return to the welcome screen. The leaderboard is kept.
    ///
    /// Accepted from `Playing` (abandoning the session) and `GameOver`.
    pub fn restart(&mut self) {
        if self.phase == SessionPhase::Welcome {
            return;
        }
        if self.phase == SessionPhase::Playing {
            warn!(score = self.machine.score(), "session abandoned");
        }
        self.machine.reset_session();
        self.phase = SessionPhase::Welcome;
        info!("back to welcome");
    }

    /// Wait for an in-flight transition to settle.
    pub async fn settled(&mut self) {
        self.machine.settled().await;
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Name of the current (or last) player.
    #[must_use]
    pub fn player(&self) -> Option<&PlayerName> {
        self.player.as_ref()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn leaderboard(&self) -> &Leaderboard {
        self.ledger.leaderboard()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&FinalResult> {
        self.last_result.as_ref()
    }

    /// Leaderboard row produced by the session that just ended, if it made the board.
    #[must_use]
    pub fn highlighted_entry(&self) -> Option<usize> {
        if self.phase != SessionPhase::GameOver {
            return None;
        }
        self.last_result.as_ref().and_then(|r| r.position)
    }
}
