//! Liveness probe delivery onto the primary execution context

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::error::ProbeError;

/// Work posted onto the primary execution context
pub type ProbeTask = Box<dyn FnOnce() + Send + 'static>;

/// Posts liveness probes onto the context being monitored
///
/// Implementations must not run the task inline: it has to wait behind
/// whatever the primary context is currently doing, otherwise a blocked
/// context would look responsive.
pub trait MainThreadProbe: Send + Sync {
    /// Enqueue `task` for execution on the primary context
    fn dispatch(&self, task: ProbeTask) -> Result<(), ProbeError>;

    /// Whether the host is in the foreground
    ///
    /// Missed deadlines are not reported while the host is backgrounded,
    /// since the primary context may legitimately be throttled.
    fn is_foreground(&self) -> bool {
        true
    }
}

/// Create a probe and the queue the primary context drains
///
/// The host keeps [`MainQueue`] on its primary thread and calls
/// [`MainQueue::run_pending`] from its event loop; the probe side is handed to
/// the hang tracker.
pub fn main_queue() -> (MainQueueProbe, MainQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    let foreground = Arc::new(AtomicBool::new(true));

    (
        MainQueueProbe {
            tx,
            foreground: Arc::clone(&foreground),
        },
        MainQueue { rx, foreground },
    )
}

/// Probe side of [`main_queue`]
#[derive(Clone)]
pub struct MainQueueProbe {
    tx: mpsc::UnboundedSender<ProbeTask>,
    foreground: Arc<AtomicBool>,
}

impl MainThreadProbe for MainQueueProbe {
    fn dispatch(&self, task: ProbeTask) -> Result<(), ProbeError> {
        self.tx.send(task).map_err(|_| ProbeError::Unreachable)
    }

    fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}

/// Primary-context side of [`main_queue`]
pub struct MainQueue {
    rx: mpsc::UnboundedReceiver<ProbeTask>,
    foreground: Arc<AtomicBool>,
}

impl MainQueue {
    /// Run every queued probe, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next probe and run it
    ///
    /// Returns `false` once every probe sender is gone.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Report whether the host is in the foreground
    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_probe_runs_only_when_drained() {
        let (probe, mut queue) = main_queue();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            probe
                .dispatch(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn test_dispatch_fails_once_queue_is_gone() {
        let (probe, queue) = main_queue();
        drop(queue);

        let result = probe.dispatch(Box::new(|| {}));
        assert_eq!(result, Err(ProbeError::Unreachable));
    }

    #[test]
    fn test_foreground_flag_is_shared() {
        let (probe, queue) = main_queue();
        assert!(probe.is_foreground());

        queue.set_foreground(false);
        assert!(!probe.is_foreground());
    }
}
