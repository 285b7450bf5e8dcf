use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use quiz_core::grader::{grade, mark_options, normalized_set};
use quiz_core::model::{AttemptRecord, OptionId, Question, QuestionBank, QuizSettings};
use quiz_core::time::elapsed_secs;

use super::plan::Shuffler;
use super::progress::SessionProgress;
use super::view::{Feedback, QuestionView};
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for a submission on the current question.
    Answering,
    /// Submission graded; waiting for `advance`.
    Feedback,
    /// Terminal until `restart`.
    Finished,
}

/// Events accepted by the session, used in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Toggle,
    Submit,
    Advance,
    ForceFinish,
    Restart,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionAction::Toggle => "toggle an option",
            SessionAction::Submit => "submit",
            SessionAction::Advance => "advance",
            SessionAction::ForceFinish => "finish",
            SessionAction::Restart => "restart",
        };
        f.write_str(name)
    }
}

/// Snapshot of quiz progress.
///
/// `score <= current_index + 1` holds at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub current_index: usize,
    pub score: u32,
    pub phase: SessionPhase,
    pub remaining_secs: u32,
}

/// Result of `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next question is loaded and waiting for an answer.
    Next,
    /// That was the last question.
    Finished(AttemptRecord),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session.
///
/// Owns the shuffled bank and the session state; every mutation goes through
/// one of the event methods below. Timestamps are passed in by the caller so
/// time stays deterministic in tests.
pub struct SessionService {
    bank: QuestionBank,
    settings: QuizSettings,
    shuffler: Shuffler,
    state: SessionState,
    answered: usize,
    option_order: Vec<OptionId>,
    selection: BTreeSet<OptionId>,
    feedback: Option<Feedback>,
    started_at: DateTime<Utc>,
    attempt: Option<AttemptRecord>,
}

impl SessionService {
    /// Create a session over `bank`, shuffling question order and the first
    /// question's options.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions.
    pub fn new(
        mut bank: QuestionBank,
        settings: QuizSettings,
        mut shuffler: Shuffler,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::Empty);
        }
        shuffler.shuffle_bank(&mut bank);

        let mut session = Self {
            bank,
            settings,
            shuffler,
            state: SessionState {
                current_index: 0,
                score: 0,
                phase: SessionPhase::Answering,
                remaining_secs: settings.duration_secs(),
            },
            answered: 0,
            option_order: Vec::new(),
            selection: BTreeSet::new(),
            feedback: None,
            started_at,
            attempt: None,
        };
        session.load_question();
        Ok(session)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.state.score
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.phase == SessionPhase::Finished
    }

    /// Total number of questions in this session.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.bank.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.state.current_index)
    }

    /// Display order of the current question's options.
    #[must_use]
    pub fn option_order(&self) -> &[OptionId] {
        &self.option_order
    }

    /// Options selected so far on the current question.
    #[must_use]
    pub fn selection(&self) -> &BTreeSet<OptionId> {
        &self.selection
    }

    /// Grading result for the current question while in `Feedback`.
    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// The record produced when the session finished.
    #[must_use]
    pub fn attempt(&self) -> Option<&AttemptRecord> {
        self.attempt.as_ref()
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::new(
            self.bank.len(),
            self.state.current_index,
            self.answered,
            self.is_finished(),
        )
    }

    /// The current question in display order; `None` once finished.
    #[must_use]
    pub fn current_view(&self) -> Option<QuestionView> {
        if self.is_finished() {
            return None;
        }
        self.current_question().map(|q| {
            QuestionView::build(
                self.state.current_index,
                self.bank.len(),
                q,
                &self.option_order,
            )
        })
    }

    /// Record the timer's remaining seconds. Ignored once finished.
    pub fn set_remaining(&mut self, remaining_secs: u32) {
        if !self.is_finished() {
            self.state.remaining_secs = remaining_secs;
        }
    }

    /// Select or deselect an option.
    ///
    /// Single-choice questions replace the selection; multi-choice questions
    /// toggle membership.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answering` and
    /// `SessionError::UnknownOption` for ids the question does not have.
    pub fn toggle(&mut self, option: OptionId) -> Result<&BTreeSet<OptionId>, SessionError> {
        self.expect_phase(SessionAction::Toggle, &[SessionPhase::Answering])?;
        let question = self.current_question().ok_or(SessionError::Empty)?;
        if question.option(option).is_none() {
            return Err(SessionError::UnknownOption(option));
        }

        if question.allows_multiple() {
            if !self.selection.remove(&option) {
                self.selection.insert(option);
            }
        } else {
            self.selection.clear();
            self.selection.insert(option);
        }
        Ok(&self.selection)
    }

    /// Grade the current selection and move to `Feedback`.
    ///
    /// # Errors
    ///
    /// See [`SessionService::submit_selection`].
    pub fn submit(&mut self) -> Result<&Feedback, SessionError> {
        let selection = self.selection.clone();
        self.grade_selection(selection)
    }

    /// Grade `selection` for the current question and move to `Feedback`.
    ///
    /// On error the session is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answering`,
    /// `SessionError::EmptySelection` for an empty selection,
    /// `SessionError::UnknownOption` for foreign ids and
    /// `SessionError::TooManySelections` for several picks on a single-choice
    /// question.
    pub fn submit_selection<I>(&mut self, selection: I) -> Result<&Feedback, SessionError>
    where
        I: IntoIterator<Item = OptionId>,
    {
        self.grade_selection(selection.into_iter().collect())
    }

    fn grade_selection(&mut self, selected: BTreeSet<OptionId>) -> Result<&Feedback, SessionError> {
        self.expect_phase(SessionAction::Submit, &[SessionPhase::Answering])?;
        let index = self.state.current_index;
        let question = self.bank.get(index).ok_or(SessionError::Empty)?;

        if selected.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        if let Some(unknown) = selected.iter().find(|id| question.option(**id).is_none()) {
            return Err(SessionError::UnknownOption(*unknown));
        }
        if !question.allows_multiple() && selected.len() > 1 {
            return Err(SessionError::TooManySelections(selected.len()));
        }

        let key = question.answer_key();
        let chosen = normalized_set(selected.iter().filter_map(|id| question.option(*id)));
        let correct = grade(&chosen, &key);

        let ordered: Vec<&str> = self
            .option_order
            .iter()
            .filter_map(|id| question.option(*id))
            .collect();
        let marks = self
            .option_order
            .iter()
            .copied()
            .zip(mark_options(ordered.as_slice(), &chosen, &key))
            .collect();
        let correct_answers = question.correct_answers().to_vec();
        let is_last = index + 1 >= self.bank.len();

        if correct {
            self.state.score = self.state.score.saturating_add(1);
        }
        self.answered += 1;
        self.state.phase = SessionPhase::Feedback;
        self.selection.clone_from(&selected);
        tracing::debug!(index, correct, score = self.state.score, "answer graded");

        Ok(self.feedback.insert(Feedback {
            correct,
            selected,
            marks,
            correct_answers,
            is_last,
        }))
    }

    /// Move past the graded question, or finish after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Feedback`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<AdvanceOutcome, SessionError> {
        self.expect_phase(SessionAction::Advance, &[SessionPhase::Feedback])?;
        if self.state.current_index + 1 < self.bank.len() {
            self.state.current_index += 1;
            self.state.phase = SessionPhase::Answering;
            self.load_question();
            Ok(AdvanceOutcome::Next)
        } else {
            self.finish(now).map(AdvanceOutcome::Finished)
        }
    }

    /// End the session now, keeping the score accumulated so far.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if already finished.
    pub fn force_finish(&mut self, now: DateTime<Utc>) -> Result<AttemptRecord, SessionError> {
        self.expect_phase(
            SessionAction::ForceFinish,
            &[SessionPhase::Answering, SessionPhase::Feedback],
        )?;
        self.finish(now)
    }

    /// Start over: reshuffle the bank and reset score, position and time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless finished.
    pub fn restart(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.expect_phase(SessionAction::Restart, &[SessionPhase::Finished])?;
        self.shuffler.shuffle_bank(&mut self.bank);
        self.state = SessionState {
            current_index: 0,
            score: 0,
            phase: SessionPhase::Answering,
            remaining_secs: self.settings.duration_secs(),
        };
        self.answered = 0;
        self.started_at = now;
        self.attempt = None;
        self.load_question();
        Ok(())
    }

    fn finish(&mut self, now: DateTime<Utc>) -> Result<AttemptRecord, SessionError> {
        let total = u32::try_from(self.bank.len()).unwrap_or(u32::MAX);
        let record = AttemptRecord::new(
            self.state.score,
            total,
            now,
            elapsed_secs(self.started_at, now),
        )?;
        self.state.phase = SessionPhase::Finished;
        self.selection.clear();
        self.attempt = Some(record.clone());
        Ok(record)
    }

    fn load_question(&mut self) {
        self.selection.clear();
        self.feedback = None;
        self.option_order = match self.bank.get(self.state.current_index) {
            Some(question) => self.shuffler.option_order(question),
            None => Vec::new(),
        };
    }

    fn expect_phase(
        &self,
        action: SessionAction,
        allowed: &[SessionPhase],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state.phase) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                phase: self.state.phase,
            })
        }
    }
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("questions_len", &self.bank.len())
            .field("state", &self.state)
            .field("answered", &self.answered)
            .field("selection", &self.selection)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
