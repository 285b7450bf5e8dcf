use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::grader::normalized_set;
use crate::model::ids::OptionId;
use crate::normalize::normalize;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("too many options: {0}")]
    TooManyOptions(usize),

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("question must have at least one correct answer")]
    NoAnswers,

    #[error("duplicate correct answer: {0}")]
    DuplicateAnswer(String),

    #[error("correct answer is not one of the options: {0}")]
    UnknownAnswer(String),

    #[error("single-choice question has {0} correct answers")]
    SingleChoiceWithManyAnswers(usize),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question input, shaped like the question data files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer: Vec<String>,
    #[serde(default)]
    pub multiple: bool,
}

impl QuestionDraft {
    /// Validate the draft into an immutable [`Question`].
    ///
    /// Options and answers are compared in normalized form, so an answer may
    /// be wrapped differently from the option it refers to.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, options are missing or
    /// duplicated, the key is empty, duplicated or references an unknown
    /// option, or a single-choice question lists more than one answer.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if u32::try_from(self.options.len()).is_err() {
            return Err(QuestionError::TooManyOptions(self.options.len()));
        }

        let mut seen = BTreeSet::new();
        for option in &self.options {
            if !seen.insert(normalize(option)) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }

        if self.answer.is_empty() {
            return Err(QuestionError::NoAnswers);
        }
        let mut key = BTreeSet::new();
        for answer in &self.answer {
            let value = normalize(answer);
            if !seen.contains(&value) {
                return Err(QuestionError::UnknownAnswer(answer.clone()));
            }
            if !key.insert(value) {
                return Err(QuestionError::DuplicateAnswer(answer.clone()));
            }
        }
        if !self.multiple && key.len() > 1 {
            return Err(QuestionError::SingleChoiceWithManyAnswers(key.len()));
        }

        Ok(Question {
            text: self.question,
            options: self.options,
            correct_answers: self.answer,
            allows_multiple: self.multiple,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_answers: Vec<String>,
    allows_multiple: bool,
}

impl Question {
    /// Convenience constructor over [`QuestionDraft::validate`].
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new<T, O, A>(
        text: T,
        options: O,
        answers: A,
        allows_multiple: bool,
    ) -> Result<Self, QuestionError>
    where
        T: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        QuestionDraft {
            question: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            answer: answers.into_iter().map(Into::into).collect(),
            multiple: allows_multiple,
        }
        .validate()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Options in declared order; position `i` has `OptionId::new(i)`.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&str> {
        self.options.get(id.index()).map(String::as_str)
    }

    /// All option ids in declared order.
    pub fn option_ids(&self) -> impl Iterator<Item = OptionId> + '_ {
        // Validation caps the option count at u32::MAX.
        (0..self.options.len()).map(|i| OptionId::new(i as u32))
    }

    /// Correct answers as written in the question data.
    #[must_use]
    pub fn correct_answers(&self) -> &[String] {
        &self.correct_answers
    }

    /// Normalized answer key used for grading.
    #[must_use]
    pub fn answer_key(&self) -> BTreeSet<String> {
        normalized_set(&self.correct_answers)
    }

    #[must_use]
    pub fn allows_multiple(&self) -> bool {
        self.allows_multiple
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(q: Question) -> Self {
        Self {
            question: q.text,
            options: q.options,
            answer: q.correct_answers,
            multiple: q.allows_multiple,
        }
    }
}
