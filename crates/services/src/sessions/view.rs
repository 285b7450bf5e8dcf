//! Presentation-agnostic snapshots handed to the rendering sink.
//!
//! No pre-formatted strings: durations stay in seconds and the sink decides
//! how to display them.

use std::collections::BTreeSet;

use quiz_core::OptionMark;
use quiz_core::model::{AttemptRecord, OptionId, Question};

/// One option in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub id: OptionId,
    pub text: String,
}

/// The current question with its options in shuffled display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 0-based position in the session.
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub allows_multiple: bool,
    pub options: Vec<OptionView>,
}

impl QuestionView {
    #[must_use]
    pub(crate) fn build(index: usize, total: usize, question: &Question, order: &[OptionId]) -> Self {
        let options = order
            .iter()
            .filter_map(|id| {
                question.option(*id).map(|text| OptionView {
                    id: *id,
                    text: text.to_owned(),
                })
            })
            .collect();
        Self {
            index,
            total,
            text: question.text().to_owned(),
            allows_multiple: question.allows_multiple(),
            options,
        }
    }
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub selected: BTreeSet<OptionId>,
    /// One mark per option, in display order.
    pub marks: Vec<(OptionId, OptionMark)>,
    /// Answer key as written in the question data.
    pub correct_answers: Vec<String>,
    pub is_last: bool,
}

/// One line of the score history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    /// 1-based row number.
    pub number: usize,
    pub score: u32,
    pub total: u32,
    pub duration_secs: u64,
    pub completed_at: String,
}

impl HistoryRow {
    #[must_use]
    pub fn from_record(number: usize, record: &AttemptRecord) -> Self {
        Self {
            number,
            score: record.score(),
            total: record.total(),
            duration_secs: record.duration_secs(),
            completed_at: record.completed_at().to_owned(),
        }
    }
}

/// Final screen: this attempt plus the whole history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub score: u32,
    pub total: u32,
    pub duration_secs: u64,
    pub history: Vec<HistoryRow>,
}

impl ResultView {
    #[must_use]
    pub fn new(attempt: &AttemptRecord, history: &[AttemptRecord]) -> Self {
        Self {
            score: attempt.score(),
            total: attempt.total(),
            duration_secs: attempt.duration_secs(),
            history: history
                .iter()
                .enumerate()
                .map(|(i, record)| HistoryRow::from_record(i + 1, record))
                .collect(),
        }
    }
}
