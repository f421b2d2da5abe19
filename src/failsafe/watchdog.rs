//! Guarded startup sentinel handling

use std::fmt;
use std::sync::Arc;

use crate::config::SentinelConfig;
use crate::sentinel::{FileStore, SentinelRecord, SentinelState, SentinelStore};

/// Invoked with the key of an attempt that crashed before finishing
pub type CrashCallback = Box<dyn Fn(&str) + Send + Sync>;

/// What `begin_startup` concluded about the previous launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// No unfinished attempt for this key was found
    NoPriorCrash,
    /// The previous attempt for this key began but never finished
    PreviousLaunchCrashed,
}

impl StartupOutcome {
    /// Whether the previous launch crashed
    pub fn is_crash(&self) -> bool {
        matches!(self, StartupOutcome::PreviousLaunchCrashed)
    }
}

/// Crash-loop detector for one guarded initialization sequence
///
/// Each watchdog owns a single slot in the sentinel store. Store failures
/// never stop startup: an unreadable slot counts as "no prior crash" and a
/// failed write is only logged.
pub struct StartupWatchdog {
    store: SentinelStore,
    slot: String,
    on_crash: Option<CrashCallback>,
}

impl StartupWatchdog {
    /// Create a watchdog owning `slot` in `store`
    pub fn new(store: SentinelStore, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
            on_crash: None,
        }
    }

    /// Create a file-backed watchdog from configuration
    pub fn from_config(config: &SentinelConfig) -> Self {
        let backend = Arc::new(FileStore::new(config.path.clone()));
        Self::new(SentinelStore::new(backend), config.slot.clone())
    }

    /// Register the callback fired when a crashed attempt is found
    pub fn with_crash_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_crash = Some(Box::new(callback));
        self
    }

    /// Store slot this watchdog owns
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Enter the guarded sequence for `key`
    ///
    /// Checks what the previous launch left behind, firing the crash
    /// callback synchronously if it was an unfinished attempt for the same
    /// key, then replaces it with a fresh `Started` record.
    pub fn begin_startup(&self, key: &str) -> StartupOutcome {
        let outcome = match self.last_record() {
            Some(record) if record.is_unfinished(key) => StartupOutcome::PreviousLaunchCrashed,
            _ => StartupOutcome::NoPriorCrash,
        };

        if outcome.is_crash() {
            tracing::warn!(
                "Previous launch crashed during startup (key: {}, slot: {})",
                key,
                self.slot
            );
            if let Some(callback) = &self.on_crash {
                callback(key);
            }
        }

        if let Err(e) = self.store.clear(&self.slot) {
            tracing::warn!("Failed to clear startup sentinel {}: {}", self.slot, e);
        }
        self.write(key, SentinelState::Started);

        tracing::debug!("Startup sequence entered (key: {})", key);
        outcome
    }

    /// Record that the guarded sequence for `key` completed
    pub fn finish_startup(&self, key: &str) {
        self.write(key, SentinelState::Succeeded);
        tracing::info!("Startup sequence completed (key: {})", key);
    }

    /// Forget any recorded attempt
    pub fn reset(&self) {
        if let Err(e) = self.store.clear(&self.slot) {
            tracing::warn!("Failed to reset startup sentinel {}: {}", self.slot, e);
        }
    }

    /// The record currently held in this watchdog's slot
    ///
    /// An unreadable slot is reported as empty.
    pub fn last_record(&self) -> Option<SentinelRecord> {
        match self.store.load(&self.slot) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    "Failed to read startup sentinel {}, assuming no prior crash: {}",
                    self.slot,
                    e
                );
                None
            }
        }
    }

    fn write(&self, key: &str, state: SentinelState) {
        let record = SentinelRecord::new(key, state);
        if let Err(e) = self.store.save(&self.slot, &record) {
            tracing::warn!(
                "Failed to write startup sentinel {} ({:?}): {}",
                self.slot,
                state,
                e
            );
        }
    }
}

impl fmt::Debug for StartupWatchdog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartupWatchdog")
            .field("slot", &self.slot)
            .field("has_crash_callback", &self.on_crash.is_some())
            .finish()
    }
}
