//! Tests for the frame delay tracker

use super::*;
use crate::config::FramesConfig;
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn tracker_16ms() -> FrameDelayTracker {
    FrameDelayTracker::with_ideal_interval(ms(16))
}

fn record_at(tracker: &FrameDelayTracker, t0: Instant, offsets_ms: &[u64]) {
    for offset in offsets_ms {
        tracker.record_frame(t0 + ms(*offset));
    }
}

#[test]
fn test_on_cadence_frames_have_no_delay() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 16, 32, 48]);

    let result = tracker.delay_between(t0, t0 + ms(48));
    assert_eq!(result.delay, Some(Duration::ZERO));
    assert_eq!(result.frame_count, 4);
    assert!(result.is_available());
}

#[test]
fn test_late_frame_accumulates_excess() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 50]);

    let result = tracker.delay_between(t0, t0 + ms(50));
    assert_eq!(result.delay, Some(ms(34)));
    assert_eq!(result.frame_count, 2);
}

#[test]
fn test_double_cadence_is_one_unit_of_delay_per_pair() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 32, 64]);

    let result = tracker.delay_between(t0, t0 + ms(64));
    assert_eq!(result.delay, Some(ms(32)));
    assert_eq!(result.frame_count, 3);
}

#[test]
fn test_fast_frames_do_not_offset_late_frames() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    // 8ms early pair followed by a 24ms late pair
    record_at(&tracker, t0, &[0, 8, 48]);

    let result = tracker.delay_between(t0, t0 + ms(48));
    assert_eq!(result.delay, Some(ms(24)));
}

#[test]
fn test_insufficient_samples_are_unavailable() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();

    let empty = tracker.delay_between(t0, t0 + ms(100));
    assert_eq!(empty.delay, None);
    assert_eq!(empty.frame_count, 0);
    assert!(!empty.is_available());

    tracker.record_frame(t0 + ms(10));
    let single = tracker.delay_between(t0, t0 + ms(100));
    assert_eq!(single.delay, None);
    assert_eq!(single.frame_count, 1);
}

#[test]
fn test_window_excludes_frames_outside_range() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 100, 116, 132]);

    // The 100ms gap before the window is not counted
    let result = tracker.delay_between(t0 + ms(100), t0 + ms(132));
    assert_eq!(result.delay, Some(Duration::ZERO));
    assert_eq!(result.frame_count, 3);
}

#[test]
fn test_out_of_order_frames_are_ignored() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 32, 16]);

    assert_eq!(tracker.retained(), 2);
    assert_eq!(tracker.last_frame(), Some(t0 + ms(32)));
}

#[test]
fn test_samples_evicted_by_age() {
    let config = FramesConfig {
        retention_ms: 100,
        ..FramesConfig::with_ideal_interval(ms(16))
    };
    let tracker = FrameDelayTracker::new(&config);
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 50, 200]);

    assert_eq!(tracker.retained(), 1);
    let result = tracker.delay_between(t0, t0 + ms(200));
    assert_eq!(result.frame_count, 1);
    assert_eq!(result.delay, None);
}

#[test]
fn test_samples_capped_by_count() {
    let config = FramesConfig {
        max_samples: 3,
        ..FramesConfig::with_ideal_interval(ms(16))
    };
    let tracker = FrameDelayTracker::new(&config);
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 16, 32, 48, 64]);

    assert_eq!(tracker.retained(), 3);
    assert_eq!(tracker.frames_between(t0, t0 + ms(64)), Some(3));
}

#[test]
fn test_slow_and_frozen_counters() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    // 16ms on time, 20ms slow, 800ms frozen
    record_at(&tracker, t0, &[0, 16, 36, 836]);

    let stats = tracker.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.slow, 1);
    assert_eq!(stats.frozen, 1);

    tracker.reset();
    assert_eq!(tracker.stats().total, 0);
    assert_eq!(tracker.retained(), 0);
}

#[test]
fn test_pause_discards_history_and_ignores_frames() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    record_at(&tracker, t0, &[0, 16, 32]);

    tracker.pause();
    assert!(!tracker.is_running());
    tracker.record_frame(t0 + ms(48));

    assert_eq!(tracker.retained(), 0);
    assert_eq!(tracker.frames_between(t0, t0 + ms(48)), None);
    assert_eq!(tracker.delay_between(t0, t0 + ms(48)).delay, None);

    tracker.resume();
    assert!(tracker.is_running());
    record_at(&tracker, t0, &[64, 80]);
    assert_eq!(
        tracker.delay_between(t0, t0 + ms(80)).delay,
        Some(Duration::ZERO)
    );
}

#[test]
fn test_frames_between_distinguishes_no_signal_from_zero_frames() {
    let tracker = tracker_16ms();
    let t0 = Instant::now();
    assert_eq!(tracker.frames_between(t0, t0 + ms(100)), None);

    tracker.record_frame(t0);
    assert_eq!(tracker.frames_between(t0 + ms(10), t0 + ms(100)), Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_delay_since_uses_current_time() {
    let tracker = tracker_16ms();
    let since = Instant::now();

    for _ in 0..3 {
        tracker.record_frame(Instant::now());
        tokio::time::advance(ms(20)).await;
    }

    // Samples at 0, 20, 40
    let result = tracker.delay(since);
    assert_eq!(result.frame_count, 3);
    assert_eq!(result.delay, Some(ms(8)));
}

proptest! {
    #[test]
    fn prop_delay_is_sum_of_per_pair_excess(
        intervals in prop::collection::vec(1u64..120, 1..64)
    ) {
        let tracker = tracker_16ms();
        let t0 = Instant::now();

        let mut offset = 0u64;
        tracker.record_frame(t0);
        for interval in &intervals {
            offset += interval;
            tracker.record_frame(t0 + ms(offset));
        }

        let expected: u64 = intervals.iter().map(|i| i.saturating_sub(16)).sum();
        let result = tracker.delay_between(t0, t0 + ms(offset));

        prop_assert_eq!(result.frame_count, intervals.len() + 1);
        prop_assert_eq!(result.delay, Some(ms(expected)));
    }
}
