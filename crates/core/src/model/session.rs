use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::item::TriviaItem;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of the question batch backing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Why a fetched batch could not be installed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BatchRejection {
    #[error("question batch is empty")]
    Empty,

    #[error("duplicate question id in batch: {0}")]
    DuplicateId(QuestionId),

    #[error("batch arrived for a session that was reset or restarted")]
    Stale,
}

/// Identifies one `begin_loading` call so late results can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket(u64);

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// First answer given for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected: String,
    pub correct: bool,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Already revealed, mid-transition, or nothing loaded.
    Ignored,
    /// The answer is locked in. `points` is 0 for wrong answers and for
    /// questions that were already scored on an earlier visit.
    Revealed { correct: bool, points: u32 },
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// An index change that has started but not yet settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PendingTransition {
    pub direction: Direction,
    pub target: usize,
    generation: u64,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStart {
    /// Another transition is in flight, there is nowhere to go, or nothing is loaded.
    Rejected,
    /// `advance` was called on the last question.
    Completed,
    /// Lock taken; call `finish_transition` once the settle delay has elapsed.
    Started(PendingTransition),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-progress trivia session.
///
/// Pure state: timing is left to the caller, which starts a transition,
/// waits out the settle delay, then finishes it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    status: BatchStatus,
    questions: Vec<TriviaItem>,
    current: usize,
    revealed: bool,
    selected: Option<String>,
    score: u32,
    transitioning: bool,
    answers: Vec<Option<AnswerRecord>>,
    generation: u64,
    transition_seq: u64,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all progress and mark a batch request as outstanding.
    pub fn begin_loading(&mut self) -> LoadTicket {
        self.clear();
        self.status = BatchStatus::Loading;
        LoadTicket(self.generation)
    }

    /// Install a fetched batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchRejection::Stale` (state untouched) if the session was
    /// reset since `ticket` was issued. Returns `Empty` or `DuplicateId` after
    /// moving the status to `Error`.
    pub fn accept_batch(
        &mut self,
        ticket: LoadTicket,
        items: Vec<TriviaItem>,
    ) -> Result<usize, BatchRejection> {
        if !self.is_current(ticket) {
            return Err(BatchRejection::Stale);
        }
        if items.is_empty() {
            self.status = BatchStatus::Error;
            return Err(BatchRejection::Empty);
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                self.status = BatchStatus::Error;
                return Err(BatchRejection::DuplicateId(item.id().clone()));
            }
        }

        self.answers = vec![None; items.len()];
        self.questions = items;
        self.status = BatchStatus::Success;
        Ok(self.questions.len())
    }

    /// Record a failed fetch. Returns `false` if `ticket` is stale.
    pub fn fail_batch(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.questions.clear();
        self.answers.clear();
        self.status = BatchStatus::Error;
        true
    }

    /// Lock in an answer for the current question.
    pub fn submit_answer(&mut self, option: &str) -> AnswerOutcome {
        if self.revealed || self.transitioning {
            return AnswerOutcome::Ignored;
        }
        let Some(item) = self.current_item() else {
            return AnswerOutcome::Ignored;
        };

        let correct = item.is_correct(option);
        let question_id = item.id().clone();
        let points = match self.answers.get(self.current) {
            Some(None) => item.points_for(option),
            // Scored on an earlier visit.
            _ => 0,
        };

        if let Some(slot) = self.answers.get_mut(self.current) {
            if slot.is_none() {
                *slot = Some(AnswerRecord {
                    question_id,
                    selected: option.to_owned(),
                    correct,
                    points,
                });
            }
        }

        self.score = self.score.saturating_add(points);
        self.selected = Some(option.to_owned());
        self.revealed = true;
        AnswerOutcome::Revealed { correct, points }
    }

    /// Start moving to the next question.
    pub fn begin_advance(&mut self) -> TransitionStart {
        if self.transitioning || !self.has_batch() {
            return TransitionStart::Rejected;
        }
        if self.is_last() {
            return TransitionStart::Completed;
        }
        self.begin_transition(Direction::Forward, self.current + 1)
    }

    /// Start moving to the previous question.
    pub fn begin_retreat(&mut self) -> TransitionStart {
        if self.transitioning || !self.has_batch() || self.current == 0 {
            return TransitionStart::Rejected;
        }
        self.begin_transition(Direction::Backward, self.current - 1)
    }

    fn begin_transition(&mut self, direction: Direction, target: usize) -> TransitionStart {
        self.transitioning = true;
        self.revealed = false;
        self.selected = None;
        self.transition_seq = self.transition_seq.wrapping_add(1);
        TransitionStart::Started(PendingTransition {
            direction,
            target,
            generation: self.generation,
            seq: self.transition_seq,
        })
    }

    /// Apply a started transition. Returns `false` if the session has been
    /// reset or the transition cancelled since it began, in which case
    /// nothing changes.
    pub fn finish_transition(&mut self, pending: PendingTransition) -> bool {
        if !self.transitioning
            || pending.generation != self.generation
            || pending.seq != self.transition_seq
        {
            return false;
        }
        self.current = pending.target;
        self.revealed = false;
        self.selected = None;
        self.transitioning = false;
        true
    }

    /// Release the transition lock without moving. Returns `false` if no
    /// transition was in flight.
    pub fn cancel_transition(&mut self) -> bool {
        if !self.transitioning {
            return false;
        }
        self.transitioning = false;
        true
    }

    /// Drop the batch and all progress, returning to `Idle`.
    pub fn reset(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.status = BatchStatus::Idle;
        self.questions.clear();
        self.answers.clear();
        self.current = 0;
        self.revealed = false;
        self.selected = None;
        self.score = 0;
        self.transitioning = false;
        self.generation = self.generation.wrapping_add(1);
    }

    fn is_current(&self, ticket: LoadTicket) -> bool {
        self.status == BatchStatus::Loading && ticket.0 == self.generation
    }

    fn has_batch(&self) -> bool {
        self.status == BatchStatus::Success && !self.questions.is_empty()
    }

    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.status
    }

    #[must_use]
    pub fn questions(&self) -> &[TriviaItem] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&TriviaItem> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.current + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// First answer recorded for each question, by index.
    #[must_use]
    pub fn answers(&self) -> &[Option<AnswerRecord>] {
        &self.answers
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().flatten().filter(|a| a.correct).count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
