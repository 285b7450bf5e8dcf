use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::question::Question;

/// Ordered collection of questions for one quiz.
///
/// The order is randomized once per session start; individual questions are
/// never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuestionBank {
    questions: Vec<Question>,
    shuffles: u64,
}

impl QuestionBank {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            shuffles: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of times [`QuestionBank::shuffle`] has run on this bank.
    #[must_use]
    pub fn shuffle_count(&self) -> u64 {
        self.shuffles
    }

    /// Randomizes question order in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.questions.as_mut_slice().shuffle(rng);
        self.shuffles = self.shuffles.saturating_add(1);
    }
}

impl From<Vec<Question>> for QuestionBank {
    fn from(questions: Vec<Question>) -> Self {
        Self::new(questions)
    }
}

impl From<QuestionBank> for Vec<Question> {
    fn from(bank: QuestionBank) -> Self {
        bank.questions
    }
}
