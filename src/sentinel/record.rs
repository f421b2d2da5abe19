//! Typed sentinel records
//!
//! A slot holds at most one record. The record names the attempt it belongs
//! to (for example a release name) and the state that attempt reached, so a
//! key that happens to be a prefix of another can never be misread.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{KeyValueStore, StoreResult};
use crate::core::error::SentinelError;

/// Progress of a guarded startup attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelState {
    /// The attempt began and has not completed
    Started,
    /// The attempt completed
    Succeeded,
}

/// One persisted sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelRecord {
    /// Caller-supplied attempt scope, e.g. a release name
    pub key: String,
    /// State the attempt reached
    pub state: SentinelState,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

impl SentinelRecord {
    /// Create a record stamped with the current time
    pub fn new(key: impl Into<String>, state: SentinelState) -> Self {
        Self {
            key: key.into(),
            state,
            recorded_at: Utc::now(),
        }
    }

    /// Whether this record is an unfinished attempt for `key`
    pub fn is_unfinished(&self, key: &str) -> bool {
        self.key == key && self.state == SentinelState::Started
    }
}

/// Reads and writes sentinel records on top of a [`KeyValueStore`]
#[derive(Clone)]
pub struct SentinelStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SentinelStore {
    /// Wrap a key-value backend
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Load the record held in `slot`
    pub fn load(&self, slot: &str) -> StoreResult<Option<SentinelRecord>> {
        let Some(raw) = self.backend.get(slot)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SentinelError::Corrupted {
                key: slot.to_string(),
                reason: e.to_string(),
            })
    }

    /// Overwrite `slot` with `record`
    pub fn save(&self, slot: &str, record: &SentinelRecord) -> StoreResult<()> {
        let raw = serde_json::to_string(record)?;
        self.backend.set(slot, &raw)
    }

    /// Forget whatever `slot` holds
    pub fn clear(&self, slot: &str) -> StoreResult<()> {
        self.backend.remove(slot)
    }
}
