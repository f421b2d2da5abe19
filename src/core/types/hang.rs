//! Hang types
//!
//! Defines the observed unresponsive period and its classification.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Severity of an observed hang
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HangType {
    /// No frame progress while the probe was outstanding
    FullyBlocking,
    /// The primary thread is slow but still rendering frames
    NonFullyBlocking,
    /// Frame data was not available to classify the hang
    Unknown,
}

impl fmt::Display for HangType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HangType::FullyBlocking => write!(f, "fully_blocking"),
            HangType::NonFullyBlocking => write!(f, "non_fully_blocking"),
            HangType::Unknown => write!(f, "unknown"),
        }
    }
}

/// An open (detected, not yet stopped) unresponsive period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HangEvent {
    /// Classification made when the hang was detected
    pub hang_type: HangType,
    /// When the missed deadline was observed
    pub detected_at: Instant,
    /// When the unanswered probe was issued
    pub probe_sent_at: Instant,
}

impl HangEvent {
    /// Time the primary thread has been unresponsive as of `now`
    pub fn duration_until(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.probe_sent_at)
    }
}

/// Delivered to listeners when an open hang closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnrStoppedResult {
    /// Classification the hang was reported with
    pub hang_type: HangType,
    /// Probe issue to acknowledgment
    pub duration: Duration,
}
