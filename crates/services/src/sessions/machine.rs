use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trivia_core::model::{
    AnswerOutcome, BatchRejection, BatchStatus, PendingTransition, Session, TransitionStart,
    TriviaItem,
};

use crate::provider::QuestionBatchProvider;

/// Pause between leaving a question and the next one becoming interactive.
pub const SETTLE_DELAY: Duration = Duration::from_millis(800);

/// Result of asking to move between questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Dropped: a transition is already in flight or there is nowhere to go.
    Ignored,
    /// The index will change once the settle delay has elapsed.
    Scheduled,
    /// `advance` on the last question; the caller finalizes the session.
    Completed,
}

/// Point-in-time view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: BatchStatus,
    pub index: usize,
    pub total: usize,
    pub item: Option<TriviaItem>,
    pub revealed: bool,
    pub selected: Option<String>,
    pub score: u32,
    pub transitioning: bool,
    pub correct: usize,
}

/// A settle step waiting on its timer.
///
/// Runs to completion unless explicitly cancelled.
pub struct ScheduledTransition {
    pending: PendingTransition,
    handle: JoinHandle<()>,
}

impl ScheduledTransition {
    fn spawn(session: Arc<Mutex<Session>>, pending: PendingTransition, delay: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let applied = lock(&session).finish_transition(pending);
            debug!(target_index = pending.target, applied, "transition settled");
        });
        Self { pending, handle }
    }
}

impl fmt::Debug for ScheduledTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTransition")
            .field("pending", &self.pending)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a `Session`: fetches its batch and times transitions between questions.
///
/// Must be used from within a tokio runtime; the settle step runs as a
/// spawned task.
pub struct SessionMachine {
    provider: Arc<dyn QuestionBatchProvider>,
    session: Arc<Mutex<Session>>,
    scheduled: Option<ScheduledTransition>,
}

impl SessionMachine {
    #[must_use]
    pub fn new(provider: Arc<dyn QuestionBatchProvider>) -> Self {
        Self {
            provider,
            session: Arc::new(Mutex::new(Session::new())),
            scheduled: None,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    /// Reset progress and load a fresh batch of `count` questions.
    ///
    /// Provider failures, empty batches and batches with duplicate ids all
    /// end in `BatchStatus::Error`.
    pub async fn start_session(&mut self, count: usize) -> BatchStatus {
        let ticket = self.session().begin_loading();
        debug!(count, "requesting question batch");

        match self.provider.request_batch(count).await {
            Ok(items) => {
                let accepted = self.session().accept_batch(ticket, items);
                match accepted {
                    Ok(loaded) => info!(loaded, "question batch loaded"),
                    Err(BatchRejection::Stale) => debug!("discarding batch for a reset session"),
                    Err(reason) => warn!(%reason, "question batch rejected"),
                }
            }
            Err(err) => {
                warn!(error = %err, "question batch request failed");
                let _ = self.session().fail_batch(ticket);
            }
        }

        self.status()
    }

    /// Lock in an answer for the current question.
    pub fn submit_answer(&self, option: &str) -> AnswerOutcome {
        let outcome = self.session().submit_answer(option);
        debug!(?outcome, "answer submitted");
        outcome
    }

    /// Move to the next question after the settle delay.
    pub fn advance(&mut self) -> TransitionOutcome {
        let start = self.session().begin_advance();
        self.schedule(start)
    }

    /// Move to the previous question after the settle delay.
    pub fn retreat(&mut self) -> TransitionOutcome {
        let start = self.session().begin_retreat();
        self.schedule(start)
    }

    fn schedule(&mut self, start: TransitionStart) -> TransitionOutcome {
        match start {
            TransitionStart::Rejected => TransitionOutcome::Ignored,
            TransitionStart::Completed => TransitionOutcome::Completed,
            TransitionStart::Started(pending) => {
                debug!(
                    direction = ?pending.direction,
                    target_index = pending.target,
                    "transition started"
                );
                self.scheduled = Some(ScheduledTransition::spawn(
                    Arc::clone(&self.session),
                    pending,
                    SETTLE_DELAY,
                ));
                TransitionOutcome::Scheduled
            }
        }
    }

    /// Wait for the in-flight transition, if any, to settle.
    pub async fn settled(&mut self) {
        let Some(scheduled) = self.scheduled.take() else {
            return;
        };
        if let Err(err) = scheduled.handle.await {
            if !err.is_cancelled() {
                warn!(error = %err, "transition task failed");
            }
        }
    }

    /// Abort the in-flight transition and release the lock without moving.
    ///
    /// Returns `false` if nothing was in flight.
    pub fn cancel_transition(&mut self) -> bool {
        let Some(scheduled) = self.scheduled.take() else {
            return false;
        };
        scheduled.handle.abort();
        let released = self.session().cancel_transition();
        debug!(target_index = scheduled.pending.target, released, "transition cancelled");
        released
    }

    /// Drop the batch and all progress. A transition still in flight
    /// finishes as a no-op.
    pub fn reset_session(&mut self) {
        self.session().reset();
        self.scheduled = None;
        debug!("session reset");
    }

    #[must_use]
    pub fn scheduled(&self) -> Option<&ScheduledTransition> {
        self.scheduled.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.session().status()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.session().score()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.session().current_index()
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.session().is_transitioning()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session();
        SessionSnapshot {
            status: session.status(),
            index: session.current_index(),
            total: session.questions().len(),
            item: session.current_item().cloned(),
            revealed: session.is_revealed(),
            selected: session.selected().map(str::to_owned),
            score: session.score(),
            transitioning: session.is_transitioning(),
            correct: session.correct_count(),
        }
    }
}

impl fmt::Debug for SessionMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionMachine")
            .field("session", &*self.session())
            .field("scheduled", &self.scheduled)
            .finish_non_exhaustive()
    }
}
