use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use quiz_core::model::{OptionId, Question, QuestionBank};

/// Source of randomness for question and option order.
///
/// Seed it for reproducible runs; the default draws from the OS.
pub struct Shuffler {
    rng: StdRng,
}

impl Shuffler {
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Randomize question order for a new session.
    pub fn shuffle_bank(&mut self, bank: &mut QuestionBank) {
        bank.shuffle(&mut self.rng);
    }

    /// A fresh random display order for `question`'s options.
    pub fn option_order(&mut self, question: &Question) -> Vec<OptionId> {
        let mut ids: Vec<OptionId> = question.option_ids().collect();
        ids.as_mut_slice().shuffle(&mut self.rng);
        ids
    }
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl std::fmt::Debug for Shuffler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shuffler").finish_non_exhaustive()
    }
}
