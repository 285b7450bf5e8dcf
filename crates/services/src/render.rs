//! Output boundary between the quiz controller and whatever displays it.

use quiz_core::model::OptionId;

use crate::sessions::{Feedback, QuestionView, ResultView, SessionProgress};

/// Visual state of a single option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Idle,
    Selected,
    Correct,
    Incorrect,
    /// Locked after submission.
    Disabled,
}

/// Short user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SelectAtLeastOne,
    SingleChoiceOnly,
    TimeUp,
    HistoryCleared,
}

impl Notice {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Notice::SelectAtLeastOne => "Please select at least one option.",
            Notice::SingleChoiceOnly => "This question accepts only one option.",
            Notice::TimeUp => "Time's up!",
            Notice::HistoryCleared => "Score history cleared.",
        }
    }
}

/// Receives every display update the controller produces.
pub trait RenderSink {
    fn render_question(&mut self, view: &QuestionView);

    fn highlight(&mut self, option: OptionId, state: OptionState);

    fn show_progress(&mut self, _progress: &SessionProgress) {}

    /// Remaining seconds on the countdown.
    fn show_timer(&mut self, _remaining_secs: u32) {}

    fn show_feedback(&mut self, feedback: &Feedback);

    fn notify(&mut self, notice: Notice);

    fn show_result(&mut self, result: &ResultView);
}

/// One recorded sink invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Question(QuestionView),
    Highlight(OptionId, OptionState),
    Progress(SessionProgress),
    Timer(u32),
    Feedback(Feedback),
    Notice(Notice),
    Result(ResultView),
}

/// Sink that keeps every call, for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Notice(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn last_question(&self) -> Option<&QuestionView> {
        self.calls.iter().rev().find_map(|call| match call {
            SinkCall::Question(view) => Some(view),
            _ => None,
        })
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&ResultView> {
        self.calls.iter().rev().find_map(|call| match call {
            SinkCall::Result(view) => Some(view),
            _ => None,
        })
    }

    #[must_use]
    pub fn last_timer(&self) -> Option<u32> {
        self.calls.iter().rev().find_map(|call| match call {
            SinkCall::Timer(secs) => Some(*secs),
            _ => None,
        })
    }

    #[must_use]
    pub fn count(&self, pred: impl Fn(&SinkCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderSink for RecordingSink {
    fn render_question(&mut self, view: &QuestionView) {
        self.calls.push(SinkCall::Question(view.clone()));
    }

    fn highlight(&mut self, option: OptionId, state: OptionState) {
        self.calls.push(SinkCall::Highlight(option, state));
    }

    fn show_progress(&mut self, progress: &SessionProgress) {
        self.calls.push(SinkCall::Progress(*progress));
    }

    fn show_timer(&mut self, remaining_secs: u32) {
        self.calls.push(SinkCall::Timer(remaining_secs));
    }

    fn show_feedback(&mut self, feedback: &Feedback) {
        self.calls.push(SinkCall::Feedback(feedback.clone()));
    }

    fn notify(&mut self, notice: Notice) {
        self.calls.push(SinkCall::Notice(notice));
    }

    fn show_result(&mut self, result: &ResultView) {
        self.calls.push(SinkCall::Result(result.clone()));
    }
}
