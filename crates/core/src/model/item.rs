use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::difficulty::Difficulty;
use crate::model::ids::QuestionId;

/// Number of options every trivia item carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriviaItemError {
    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("expected {OPTION_COUNT} options, got {len}")]
    WrongOptionCount { len: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("answer is not one of the options: {0}")]
    AnswerNotInOptions(String),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated trivia item as it arrives from a question source.
///
/// Field names follow the JSON shape question sources produce. A missing or
/// blank `id` is replaced by a generated one during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaItemDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub context: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: String,
}

impl TriviaItemDraft {
    /// Validate the draft into a `TriviaItem`.
    ///
    /// Text fields are trimmed before checks.
    ///
    /// # Errors
    ///
    /// Returns `TriviaItemError` if the prompt is empty, there are not exactly
    /// four distinct non-empty options, or the answer is not one of them.
    pub fn validate(self) -> Result<TriviaItem, TriviaItemError> {
        let prompt = self.question.trim().to_owned();
        if prompt.is_empty() {
            return Err(TriviaItemError::EmptyPrompt);
        }

        if self.options.len() != OPTION_COUNT {
            return Err(TriviaItemError::WrongOptionCount {
                len: self.options.len(),
            });
        }

        let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);
        for (index, raw) in self.options.iter().enumerate() {
            let option = raw.trim();
            if option.is_empty() {
                return Err(TriviaItemError::EmptyOption { index });
            }
            if options.iter().any(|existing| existing == option) {
                return Err(TriviaItemError::DuplicateOption(option.to_owned()));
            }
            options.push(option.to_owned());
        }
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|v: Vec<String>| TriviaItemError::WrongOptionCount { len: v.len() })?;

        let answer = self.answer.trim();
        if !options.iter().any(|o| o == answer) {
            return Err(TriviaItemError::AnswerNotInOptions(answer.to_owned()));
        }

        let id = self
            .id
            .and_then(|raw| QuestionId::new(raw).ok())
            .unwrap_or_else(QuestionId::generate);

        Ok(TriviaItem {
            id,
            prompt,
            answer: answer.to_owned(),
            options,
            note: self.context.trim().to_owned(),
            difficulty: self.difficulty,
            category: self.category.trim().to_owned(),
        })
    }
}

//
// ─── ITEM ──────────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// Always has four distinct options, one of which is the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaItem {
    id: QuestionId,
    prompt: String,
    options: [String; OPTION_COUNT],
    answer: String,
    note: String,
    difficulty: Difficulty,
    category: String,
}

impl TriviaItem {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Explanatory note shown once the answer is revealed.
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.answer == option
    }

    /// Points this item awards for the given option: the tier value when correct, 0 otherwise.
    #[must_use]
    pub fn points_for(&self, option: &str) -> u32 {
        if self.is_correct(option) {
            self.difficulty.points()
        } else {
            0
        }
    }

    /// Converts the item back into its source shape.
    #[must_use]
    pub fn to_draft(&self) -> TriviaItemDraft {
        TriviaItemDraft {
            id: Some(self.id.to_string()),
            question: self.prompt.clone(),
            options: self.options.to_vec(),
            answer: self.answer.clone(),
            context: self.note.clone(),
            difficulty: self.difficulty,
            category: self.category.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
