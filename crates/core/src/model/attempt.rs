use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{DurationParseError, format_duration, parse_duration};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error(transparent)]
    Duration(#[from] DurationParseError),
}

/// Summary of one completed or forcibly finished quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedAttempt", into = "PersistedAttempt")]
pub struct AttemptRecord {
    score: u32,
    total: u32,
    completed_at: String,
    duration_secs: u64,
}

impl AttemptRecord {
    /// Build a record for a session that finished at `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ScoreExceedsTotal` if `score > total`.
    pub fn new(
        score: u32,
        total: u32,
        completed_at: DateTime<Utc>,
        duration_secs: u64,
    ) -> Result<Self, AttemptError> {
        Self::from_persisted(score, total, completed_at.to_rfc3339(), duration_secs)
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// The completion timestamp is kept verbatim; older entries may carry a
    /// locale-formatted date rather than RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ScoreExceedsTotal` if `score > total`.
    pub fn from_persisted(
        score: u32,
        total: u32,
        completed_at: impl Into<String>,
        duration_secs: u64,
    ) -> Result<Self, AttemptError> {
        if score > total {
            return Err(AttemptError::ScoreExceedsTotal { score, total });
        }
        Ok(Self {
            score,
            total,
            completed_at: completed_at.into(),
            duration_secs,
        })
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn completed_at(&self) -> &str {
        &self.completed_at
    }

    /// Completion time, when the stored text is RFC 3339.
    #[must_use]
    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.completed_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Duration in the `"1h 2m 3s"` display form.
    #[must_use]
    pub fn duration_text(&self) -> String {
        format_duration(self.duration_secs)
    }
}

/// Stored shape: `{ "score", "total", "date", "duration" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedAttempt {
    score: u32,
    total: u32,
    date: String,
    duration: String,
}

impl TryFrom<PersistedAttempt> for AttemptRecord {
    type Error = AttemptError;

    fn try_from(p: PersistedAttempt) -> Result<Self, Self::Error> {
        let duration_secs = parse_duration(&p.duration)?;
        Self::from_persisted(p.score, p.total, p.date, duration_secs)
    }
}

impl From<AttemptRecord> for PersistedAttempt {
    fn from(r: AttemptRecord) -> Self {
        Self {
            score: r.score,
            total: r.total,
            duration: format_duration(r.duration_secs),
            date: r.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn record_serializes_in_stored_shape() {
        let record = AttemptRecord::new(7, 10, fixed_now(), 3723).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["score"], 7);
        assert_eq!(json["total"], 10);
        assert_eq!(json["date"], "2023-11-14T22:13:20+00:00");
        assert_eq!(json["duration"], "1h 2m 3s");

        let back: AttemptRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.completed_at_utc(), Some(fixed_now()));
    }

    #[test]
    fn locale_dates_are_kept_verbatim() {
        let json = r#"{"score": 1, "total": 1, "date": "5/1/2025, 10:00:00 AM", "duration": "42s"}"#;
        let record: AttemptRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.completed_at(), "5/1/2025, 10:00:00 AM");
        assert_eq!(record.completed_at_utc(), None);
        assert_eq!(record.duration_secs(), 42);
    }

    #[test]
    fn score_above_total_is_rejected() {
        let err = AttemptRecord::new(3, 2, fixed_now(), 0).unwrap_err();
        assert_eq!(err, AttemptError::ScoreExceedsTotal { score: 3, total: 2 });

        let json = r#"{"score": 3, "total": 2, "date": "x", "duration": "1s"}"#;
        assert!(serde_json::from_str::<AttemptRecord>(json).is_err());
    }
}
