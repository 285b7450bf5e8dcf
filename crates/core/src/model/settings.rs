use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("quiz duration must be > 0 seconds")]
    InvalidDuration,
}

/// Quiz-wide configuration.
///
/// The number of questions is not configured here; it follows the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    duration_secs: u32,
}

impl QuizSettings {
    /// Default time limit: 90 minutes.
    pub const DEFAULT_DURATION_SECS: u32 = 90 * 60;

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidDuration` if `duration_secs` is zero.
    pub fn new(duration_secs: u32) -> Result<Self, SettingsError> {
        if duration_secs == 0 {
            return Err(SettingsError::InvalidDuration);
        }
        Ok(Self { duration_secs })
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            duration_secs: Self::DEFAULT_DURATION_SECS,
        }
    }
}
