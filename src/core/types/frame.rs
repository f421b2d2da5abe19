//! Frame types
//!
//! Frame boundaries and the delay computed over them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One observed frame boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameSample {
    /// Monotonic time of frame presentation
    pub timestamp: Instant,
}

/// Frame delay over a time window
///
/// `delay` is `None` when fewer than two samples fall in the window. That is
/// "no signal", which callers must not confuse with a true zero delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayResult {
    /// Accumulated lag behind the ideal cadence
    pub delay: Option<Duration>,
    /// Frames observed in the window
    pub frame_count: usize,
}

impl DelayResult {
    /// A result without enough samples to compute a delta
    pub fn unavailable(frame_count: usize) -> Self {
        Self {
            delay: None,
            frame_count,
        }
    }

    /// Whether a delay could be computed
    pub fn is_available(&self) -> bool {
        self.delay.is_some()
    }
}

/// Running frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    /// All frames recorded since the last reset
    pub total: u64,
    /// Frames whose interval exceeded the ideal cadence
    pub slow: u64,
    /// Frames whose interval exceeded the frozen threshold
    pub frozen: u64,
}
