//! Bounded frame history and delay computation

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::FramesConfig;
use crate::core::types::{DelayResult, FrameSample, FrameStats};

/// Frame history shared between the rendering pipeline and readers
struct FrameHistory {
    samples: VecDeque<FrameSample>,
    stats: FrameStats,
    paused: bool,
}

/// Tracks frame presentation against an ideal cadence
///
/// One writer records frames; readers compute delay over a window. Every
/// operation is an in-memory scan of at most `max_samples` entries, so it is
/// safe to call from the hang tracker's timer.
pub struct FrameDelayTracker {
    ideal_interval: Duration,
    retention: Duration,
    frozen_threshold: Duration,
    max_samples: usize,
    history: Mutex<FrameHistory>,
}

impl FrameDelayTracker {
    /// Create a tracker from configuration
    pub fn new(config: &FramesConfig) -> Self {
        let max_samples = config.max_samples.max(2);
        Self {
            ideal_interval: config.ideal_frame_interval(),
            retention: config.retention(),
            frozen_threshold: config.frozen_frame_threshold(),
            max_samples,
            history: Mutex::new(FrameHistory {
                samples: VecDeque::with_capacity(max_samples.min(1024)),
                stats: FrameStats::default(),
                paused: false,
            }),
        }
    }

    /// Create a tracker with default settings and the given ideal cadence
    pub fn with_ideal_interval(ideal_interval: Duration) -> Self {
        Self::new(&FramesConfig::with_ideal_interval(ideal_interval))
    }

    /// Ideal frame cadence
    pub fn ideal_interval(&self) -> Duration {
        self.ideal_interval
    }

    /// Record a presented frame
    ///
    /// Samples older than the retention window (relative to this frame) are
    /// evicted. Timestamps earlier than the latest sample are ignored.
    pub fn record_frame(&self, timestamp: Instant) {
        let mut history = self.history.lock();
        if history.paused {
            return;
        }

        if let Some(last) = history.samples.back() {
            if timestamp < last.timestamp {
                tracing::debug!("Ignoring out-of-order frame timestamp");
                return;
            }

            let interval = timestamp - last.timestamp;
            if interval > self.frozen_threshold {
                history.stats.frozen += 1;
            } else if interval > self.ideal_interval {
                history.stats.slow += 1;
            }
        }

        history.stats.total += 1;
        history.samples.push_back(FrameSample { timestamp });

        // Evict by age, then by count
        while let Some(oldest) = history.samples.front() {
            if timestamp.saturating_duration_since(oldest.timestamp) > self.retention {
                history.samples.pop_front();
            } else {
                break;
            }
        }
        while history.samples.len() > self.max_samples {
            history.samples.pop_front();
        }
    }

    /// Delay for samples in `[since, now]`
    pub fn delay(&self, since: Instant) -> DelayResult {
        self.delay_between(since, Instant::now())
    }

    /// Delay for samples in `[since, until]`
    ///
    /// Sums, over each pair of consecutive samples, how much the interval
    /// exceeded the ideal cadence. Faster-than-ideal pairs contribute zero.
    pub fn delay_between(&self, since: Instant, until: Instant) -> DelayResult {
        let history = self.history.lock();
        if history.paused {
            return DelayResult::unavailable(0);
        }

        let mut frame_count = 0usize;
        let mut delay = Duration::ZERO;
        let mut previous: Option<Instant> = None;

        for sample in history
            .samples
            .iter()
            .filter(|s| s.timestamp >= since && s.timestamp <= until)
        {
            if let Some(prev) = previous {
                let actual = sample.timestamp - prev;
                delay += actual.saturating_sub(self.ideal_interval);
            }
            previous = Some(sample.timestamp);
            frame_count += 1;
        }

        if frame_count < 2 {
            return DelayResult::unavailable(frame_count);
        }

        DelayResult {
            delay: Some(delay),
            frame_count,
        }
    }

    /// Frames presented in `[since, until]`, or `None` when the tracker has
    /// no frame signal at all (paused or never fed)
    pub fn frames_between(&self, since: Instant, until: Instant) -> Option<usize> {
        let history = self.history.lock();
        if history.paused || history.samples.is_empty() {
            return None;
        }

        Some(
            history
                .samples
                .iter()
                .filter(|s| s.timestamp >= since && s.timestamp <= until)
                .count(),
        )
    }

    /// Timestamp of the most recent frame
    pub fn last_frame(&self) -> Option<Instant> {
        self.history.lock().samples.back().map(|s| s.timestamp)
    }

    /// Number of retained samples
    pub fn retained(&self) -> usize {
        self.history.lock().samples.len()
    }

    /// Running frame counters
    pub fn stats(&self) -> FrameStats {
        self.history.lock().stats
    }

    /// Whether frames are currently being accepted
    pub fn is_running(&self) -> bool {
        !self.history.lock().paused
    }

    /// Stop accepting frames and discard history
    ///
    /// Delay cannot be computed across a pause, so queries report
    /// "unavailable" until frames arrive again after [`resume`](Self::resume).
    pub fn pause(&self) {
        let mut history = self.history.lock();
        history.paused = true;
        history.samples.clear();
        tracing::debug!("Frame delay tracker paused");
    }

    /// Accept frames again after [`pause`](Self::pause)
    pub fn resume(&self) {
        let mut history = self.history.lock();
        history.paused = false;
        tracing::debug!("Frame delay tracker resumed");
    }

    /// Discard history and counters
    pub fn reset(&self) {
        let mut history = self.history.lock();
        history.samples.clear();
        history.stats = FrameStats::default();
    }
}

impl Default for FrameDelayTracker {
    fn default() -> Self {
        Self::new(&FramesConfig::default())
    }
}
