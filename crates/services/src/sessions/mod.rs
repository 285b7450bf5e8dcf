mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::Shuffler;
pub use progress::SessionProgress;
pub use service::{AdvanceOutcome, SessionAction, SessionPhase, SessionService, SessionState};
pub use view::{Feedback, HistoryRow, OptionView, QuestionView, ResultView};
pub use workflow::{QuizRunner, TimerOutcome};
