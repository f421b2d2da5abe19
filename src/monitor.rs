//! Health Monitor
//!
//! Wires the hang tracker, frame delay tracker and startup watchdog from a
//! single [`HealthConfig`].

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::anr::{AnrTracker, MainThreadProbe};
use crate::config::HealthConfig;
use crate::core::error::Result;
use crate::failsafe::StartupWatchdog;
use crate::frames::FrameDelayTracker;
use crate::sentinel::{FileStore, SentinelStore};

/// The runtime health components of one process
///
/// The hang tracker classifies hangs using this monitor's frame tracker.
/// Monitoring itself only runs while the hang tracker has listeners.
pub struct HealthMonitor {
    config: HealthConfig,
    frames: Arc<FrameDelayTracker>,
    anr: AnrTracker,
    watchdog: StartupWatchdog,
}

impl HealthMonitor {
    /// Build a monitor on `runtime` with an explicit sentinel store
    pub fn new(
        config: HealthConfig,
        probe: Arc<dyn MainThreadProbe>,
        store: SentinelStore,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let frames = Arc::new(FrameDelayTracker::new(&config.frames));
        let anr = AnrTracker::new(
            config.anr.clone(),
            probe,
            Some(Arc::clone(&frames)),
            runtime,
        );
        let watchdog = StartupWatchdog::new(store, config.sentinel.slot.clone());

        tracing::info!(
            "Health monitor ready (probe timeout: {:?}, ideal frame interval: {:?})",
            config.anr.timeout(),
            config.frames.ideal_frame_interval()
        );

        Ok(Self {
            config,
            frames,
            anr,
            watchdog,
        })
    }

    /// Build a monitor whose sentinels persist to `config.sentinel.path`
    pub fn with_file_store(
        config: HealthConfig,
        probe: Arc<dyn MainThreadProbe>,
        runtime: Handle,
    ) -> Result<Self> {
        let backend = Arc::new(FileStore::new(config.sentinel.path.clone()));
        Self::new(config, probe, SentinelStore::new(backend), runtime)
    }

    /// Register the callback fired when the previous launch crashed during
    /// startup
    pub fn with_crash_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.watchdog = self.watchdog.with_crash_callback(callback);
        self
    }

    /// Hang tracker
    pub fn anr(&self) -> &AnrTracker {
        &self.anr
    }

    /// Frame delay tracker; the rendering pipeline feeds it
    pub fn frames(&self) -> &Arc<FrameDelayTracker> {
        &self.frames
    }

    /// Startup watchdog
    pub fn watchdog(&self) -> &StartupWatchdog {
        &self.watchdog
    }

    /// Configuration the monitor was built with
    pub fn config(&self) -> &HealthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anr::{main_queue, AnrListener};
    use crate::config::AnrConfig;
    use crate::core::error::HealthError;
    use crate::core::types::{AnrStoppedResult, HangType};
    use crate::failsafe::StartupOutcome;
    use crate::sentinel::MemoryStore;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::{self, Instant};

    #[derive(Default)]
    struct Recorder {
        detected: Mutex<Vec<HangType>>,
        stopped: Mutex<Vec<AnrStoppedResult>>,
    }

    impl AnrListener for Recorder {
        fn anr_detected(&self, hang_type: HangType) {
            self.detected.lock().push(hang_type);
        }

        fn anr_stopped(&self, result: AnrStoppedResult) {
            self.stopped.lock().push(result);
        }
    }

    fn memory_store() -> SentinelStore {
        SentinelStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let (probe, _queue) = main_queue();
        let config = HealthConfig {
            anr: AnrConfig {
                timeout_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = HealthMonitor::new(config, Arc::new(probe), memory_store(), Handle::current());
        assert!(matches!(result, Err(HealthError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undrained_main_queue_is_a_fully_blocking_hang() {
        let (probe, mut queue) = main_queue();
        let monitor = HealthMonitor::new(
            HealthConfig::default(),
            Arc::new(probe),
            memory_store(),
            Handle::current(),
        )
        .unwrap();

        monitor.frames().record_frame(Instant::now());
        let recorder = Arc::new(Recorder::default());
        monitor.anr().add(&recorder);

        // Nothing drains the queue: the primary thread is stuck
        time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(*recorder.detected.lock(), vec![HangType::FullyBlocking]);
        assert!(recorder.stopped.lock().is_empty());

        assert_eq!(queue.run_pending(), 1);
        time::sleep(Duration::from_millis(100)).await;

        let stopped = recorder.stopped.lock().clone();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].hang_type, HangType::FullyBlocking);
        assert_eq!(stopped[0].duration, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_watchdog_uses_configured_slot() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = HealthConfig::default();
        config.sentinel.path = temp_dir.path().join("sentinels.json");
        config.sentinel.slot = "sdk-init".to_string();

        let (probe, _queue) = main_queue();
        let probe: Arc<dyn MainThreadProbe> = Arc::new(probe);

        let crashed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&crashed);
        let monitor = HealthMonitor::with_file_store(config.clone(), Arc::clone(&probe), Handle::current())
            .unwrap()
            .with_crash_callback(move |key| sink.lock().push(key.to_string()));

        assert_eq!(monitor.watchdog().slot(), "sdk-init");
        assert_eq!(monitor.watchdog().begin_startup("v1"), StartupOutcome::NoPriorCrash);
        drop(monitor);

        let sink = Arc::clone(&crashed);
        let monitor = HealthMonitor::with_file_store(config, probe, Handle::current())
            .unwrap()
            .with_crash_callback(move |key| sink.lock().push(key.to_string()));
        assert!(monitor.watchdog().begin_startup("v1").is_crash());
        assert_eq!(*crashed.lock(), vec!["v1".to_string()]);
        assert_eq!(monitor.config().sentinel.slot, "sdk-init");
    }
}
