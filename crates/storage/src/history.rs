//! Append-only score history persisted as a JSON array under one fixed key.

use std::sync::Arc;

use quiz_core::model::AttemptRecord;

use crate::repository::{KeyValueStore, StorageError};

/// Fixed storage key for the history log.
pub const HISTORY_KEY: &str = "quizScoreHistory";

/// Chronological log of finished attempts.
///
/// `list` fails soft and treats a missing, unreadable or malformed log as
/// empty. `append` only rebuilds a missing or malformed log; a backend read
/// error is returned so the stored records are never overwritten.
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl HistoryStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, HISTORY_KEY)
    }

    /// History stored under a custom key.
    #[must_use]
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All recorded attempts, oldest first.
    pub async fn list(&self) -> Vec<AttemptRecord> {
        match self.read_log().await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "history unreadable, using empty log");
                Vec::new()
            }
        }
    }

    /// Append `record` and return the new log length.
    ///
    /// A corrupt log is replaced; an unreadable one is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the current log cannot be read or the
    /// updated log cannot be written.
    pub async fn append(&self, record: AttemptRecord) -> Result<usize, StorageError> {
        let mut records = self.read_log().await?;
        records.push(record);
        let raw = serde_json::to_string(&records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.put(&self.key, &raw).await?;
        tracing::debug!(key = %self.key, len = records.len(), "history appended");
        Ok(records.len())
    }

    /// Missing or malformed data is an empty log; backend errors are not.
    async fn read_log(&self) -> Result<Vec<AttemptRecord>, StorageError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<AttemptRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "history corrupt, using empty log");
                Ok(Vec::new())
            }
        }
    }

    /// Delete every recorded attempt. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key).await?;
        tracing::info!(key = %self.key, "history cleared");
        Ok(())
    }
}
