#![forbid(unsafe_code)]

pub mod error;
pub mod render;
pub mod sessions;
pub mod timer;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use render::{Notice, OptionState, RecordingSink, RenderSink, SinkCall};
pub use sessions::{
    AdvanceOutcome, Feedback, HistoryRow, OptionView, QuestionView, QuizRunner, ResultView,
    SessionAction, SessionPhase, SessionProgress, SessionService, SessionState, Shuffler,
    TimerOutcome,
};
pub use timer::{QuizTimer, TimerEvent};
