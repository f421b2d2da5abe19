//! Hang detection loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::listener::{AnrListener, ListenerId, ListenerRegistry};
use super::probe::MainThreadProbe;
use crate::config::AnrConfig;
use crate::core::error::{HealthError, ProbeError, Result};
use crate::core::types::{AnrStoppedResult, HangEvent, HangType};
use crate::frames::FrameDelayTracker;

/// A probe posted to the primary context that has not been acknowledged
struct PendingProbe {
    sent_at: Instant,
    /// Start of the current deadline; re-armed each cycle the probe is reused
    armed_at: Instant,
    ack: oneshot::Receiver<()>,
}

/// Running monitoring task
struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// State shared with the monitoring task
struct Shared {
    config: AnrConfig,
    probe: Arc<dyn MainThreadProbe>,
    frames: Option<Arc<FrameDelayTracker>>,
    listeners: ListenerRegistry,
    hang: Mutex<Option<HangEvent>>,
}

/// Detects and reports primary-context hangs
///
/// Monitoring runs only while at least one listener is registered: the task
/// starts on the first [`add`](Self::add) and stops when the last listener is
/// removed or on [`clear`](Self::clear).
pub struct AnrTracker {
    shared: Arc<Shared>,
    runtime: Handle,
    worker: Mutex<Option<Worker>>,
    paused: AtomicBool,
}

impl AnrTracker {
    /// Create a tracker whose monitoring task runs on `runtime`
    ///
    /// Without a frame tracker every hang is classified as
    /// [`HangType::Unknown`].
    pub fn new(
        config: AnrConfig,
        probe: Arc<dyn MainThreadProbe>,
        frames: Option<Arc<FrameDelayTracker>>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                probe,
                frames,
                listeners: ListenerRegistry::new(),
                hang: Mutex::new(None),
            }),
            runtime,
            worker: Mutex::new(None),
            paused: AtomicBool::new(false),
        }
    }

    /// Create a tracker on the runtime the caller is running in
    pub fn on_current_runtime(
        config: AnrConfig,
        probe: Arc<dyn MainThreadProbe>,
        frames: Option<Arc<FrameDelayTracker>>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| HealthError::NoRuntime(e.to_string()))?;
        Ok(Self::new(config, probe, frames, runtime))
    }

    /// Register a listener
    ///
    /// The tracker holds the listener weakly; dropping the last `Arc`
    /// unregisters it.
    pub fn add<L: AnrListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        let weak: Weak<L> = Arc::downgrade(listener);
        let weak: Weak<dyn AnrListener> = weak;
        let (id, count) = self.shared.listeners.add(weak);
        tracing::debug!("ANR listener {} added ({} registered)", id, count);

        self.ensure_running();
        id
    }

    /// Unregister a listener
    ///
    /// After this returns the listener is never notified again, even if a
    /// notification was in flight. Removing the last listener stops
    /// monitoring. Returns whether the token was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        match self.shared.listeners.remove(id) {
            Some(remaining) => {
                tracing::debug!("ANR listener {} removed ({} remaining)", id, remaining);
                if remaining == 0 {
                    self.stop();
                }
                true
            }
            None => false,
        }
    }

    /// Unregister every listener and stop monitoring
    ///
    /// An open hang is discarded without an `anr_stopped` notification.
    pub fn clear(&self) {
        self.stop();
        self.shared.listeners.clear();
        tracing::debug!("ANR tracker cleared");
    }

    /// Suspend monitoring while keeping listeners registered
    ///
    /// An open hang is discarded without an `anr_stopped` notification.
    /// Listeners added while paused are registered but not monitored until
    /// [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.stop();
        tracing::debug!("ANR tracking paused");
    }

    /// Resume monitoring after [`pause`](Self::pause)
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        if !self.shared.listeners.is_empty() {
            self.ensure_running();
        }
        tracing::debug!("ANR tracking resumed");
    }

    /// Whether monitoring is paused
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// The hang currently open, if any
    pub fn current_hang(&self) -> Option<HangEvent> {
        *self.shared.hang.lock()
    }

    /// Registered listeners that are still alive
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Whether the monitoring task is running
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map_or(false, |worker| !worker.handle.is_finished())
    }

    fn ensure_running(&self) {
        if self.is_paused() {
            return;
        }

        let mut worker = self.worker.lock();
        if worker
            .as_ref()
            .map_or(false, |w| !w.token.is_cancelled() && !w.handle.is_finished())
        {
            return;
        }

        let token = CancellationToken::new();
        let shared = Arc::clone(&self.shared);
        let task_token = token.clone();
        let handle = self
            .runtime
            .spawn(async move { shared.run(task_token).await });

        *worker = Some(Worker { token, handle });
        tracing::info!(
            "ANR tracking started (interval: {:?}, timeout: {:?})",
            self.shared.config.probe_interval(),
            self.shared.config.timeout()
        );
    }

    /// Cancel the monitoring task and forget any open hang
    ///
    /// The task only writes hang state while its token is live, so the token
    /// must be cancelled before the reset.
    fn stop(&self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.token.cancel();
            tracing::info!("ANR tracking stopped");
        }
        *self.shared.hang.lock() = None;
    }
}

impl Drop for AnrTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    async fn run(self: Arc<Self>, token: CancellationToken) {
        let timeout = self.config.timeout();
        let mut ticker = time::interval(self.config.probe_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending: Option<PendingProbe> = None;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // A fresh probe gets the full timeout from when it was sent; a
            // probe still outstanding from an earlier cycle is re-armed
            let mut probe = match pending.take() {
                Some(mut probe) => {
                    probe.armed_at = Instant::now();
                    probe
                }
                None => match self.dispatch_probe() {
                    Ok(probe) => probe,
                    Err(e) => {
                        self.on_delivery_failure(&token, &e);
                        continue;
                    }
                },
            };
            let wait_until = probe.armed_at + timeout;

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                outcome = time::timeout_at(wait_until, &mut probe.ack) => outcome,
            };

            match outcome {
                Ok(Ok(())) => self.on_responsive(&token),
                Ok(Err(_)) => self.on_delivery_failure(&token, &ProbeError::Dropped),
                Err(_) => {
                    if self.on_deadline_missed(&token, &probe) {
                        pending = Some(probe);
                    }
                }
            }
        }

        tracing::debug!("ANR monitoring loop exited");
    }

    fn dispatch_probe(&self) -> std::result::Result<PendingProbe, ProbeError> {
        let (tx, rx) = oneshot::channel();
        let sent_at = Instant::now();

        self.probe.dispatch(Box::new(move || {
            let _ = tx.send(());
        }))?;

        Ok(PendingProbe {
            sent_at,
            armed_at: sent_at,
            ack: rx,
        })
    }

    /// The probe ran: close an open hang
    fn on_responsive(&self, token: &CancellationToken) {
        let closed = {
            let mut hang = self.hang.lock();
            if token.is_cancelled() {
                return;
            }
            hang.take()
        };

        if let Some(event) = closed {
            let result = AnrStoppedResult {
                hang_type: event.hang_type,
                duration: event.duration_until(Instant::now()),
            };
            tracing::info!(
                "ANR stopped ({}, lasted {:?})",
                result.hang_type,
                result.duration
            );
            self.notify_stopped(token, result);
        }
    }

    /// The probe deadline passed; returns whether the probe stays pending
    fn on_deadline_missed(&self, token: &CancellationToken, probe: &PendingProbe) -> bool {
        let now = Instant::now();

        if !self.probe.is_foreground() {
            // Keep waiting on the same probe so a blocked context does not
            // accumulate a new one every cycle
            tracing::debug!("Probe deadline missed while in background, not reporting");
            return true;
        }

        let waited = now.saturating_duration_since(probe.armed_at);
        if self.hang.lock().is_none() && waited > self.config.suspension_limit() {
            // The timer itself was held up far past its deadline, which
            // means the whole process was suspended
            tracing::debug!(
                "Probe deadline fired {:?} after arming, treating as suspension",
                waited
            );
            return false;
        }

        self.open_hang(token, probe.sent_at, now);
        true
    }

    /// The probe could not be delivered: assume the primary context is hung
    fn on_delivery_failure(&self, token: &CancellationToken, error: &ProbeError) {
        tracing::warn!("ANR probe delivery failed, treating as hang: {}", error);
        let now = Instant::now();
        self.open_hang(token, now, now);
    }

    fn open_hang(&self, token: &CancellationToken, probe_sent_at: Instant, now: Instant) {
        let opened = {
            let mut hang = self.hang.lock();
            if token.is_cancelled() || hang.is_some() {
                return;
            }

            let event = HangEvent {
                hang_type: self.classify(probe_sent_at, now),
                detected_at: now,
                probe_sent_at,
            };
            *hang = Some(event);
            event
        };

        tracing::warn!(
            "ANR detected ({}, unresponsive for {:?})",
            opened.hang_type,
            opened.duration_until(now)
        );
        self.notify_detected(token, opened.hang_type);
    }

    fn classify(&self, since: Instant, until: Instant) -> HangType {
        let frames = match &self.frames {
            Some(frames) => frames,
            None => return HangType::Unknown,
        };

        match frames.frames_between(since, until) {
            None => HangType::Unknown,
            Some(count) if count <= self.config.max_frames_for_fully_blocking => {
                HangType::FullyBlocking
            }
            Some(_) => HangType::NonFullyBlocking,
        }
    }

    fn notify_detected(&self, token: &CancellationToken, hang_type: HangType) {
        if token.is_cancelled() {
            return;
        }
        self.listeners.notify(|listener| listener.anr_detected(hang_type));
    }

    fn notify_stopped(&self, token: &CancellationToken, result: AnrStoppedResult) {
        if token.is_cancelled() {
            return;
        }
        self.listeners.notify(|listener| listener.anr_stopped(result));
    }
}
