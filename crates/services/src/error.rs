//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptError, OptionId};
use storage::repository::StorageError;

use crate::sessions::{SessionAction, SessionPhase};

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("select at least one option")]
    EmptySelection,
    #[error("question accepts a single option, {0} selected")]
    TooManySelections(usize),
    #[error("unknown option: {0}")]
    UnknownOption(OptionId),
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: SessionAction,
        phase: SessionPhase,
    },
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True for input problems the user can correct; session state is unchanged.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionError::EmptySelection
                | SessionError::TooManySelections(_)
                | SessionError::UnknownOption(_)
        )
    }
}
