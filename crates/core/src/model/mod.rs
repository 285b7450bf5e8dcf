mod attempt;
mod bank;
mod ids;
mod question;
mod settings;

pub use attempt::{AttemptError, AttemptRecord};
pub use bank::QuestionBank;
pub use ids::OptionId;
pub use question::{Question, QuestionDraft, QuestionError};
pub use settings::{QuizSettings, SettingsError};
