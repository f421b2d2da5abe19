//! Listener registry
//!
//! Listeners are held weakly: the registry never extends a listener's
//! lifetime, and dropped listeners are pruned on the next notification.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use uuid::Uuid;

use crate::core::types::{AnrStoppedResult, HangType};

/// Receives hang notifications
///
/// Callbacks run on the tracker's background task. They may call back into
/// the tracker, including removing themselves.
pub trait AnrListener: Send + Sync {
    /// A hang was detected
    fn anr_detected(&self, hang_type: HangType);

    /// The hang reported by the last `anr_detected` ended
    fn anr_stopped(&self, result: AnrStoppedResult);
}

/// Registration token returned by `add`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registration
///
/// The slot lock is held while the listener runs. Removal clears the slot
/// under the same lock, so it waits for an in-flight callback on another
/// thread and re-enters when the callback itself removes the listener.
type Slot = ReentrantMutex<RefCell<Option<Weak<dyn AnrListener>>>>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: Mutex<Vec<(ListenerId, Arc<Slot>)>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning its token and the live listener count
    pub(crate) fn add(&self, listener: Weak<dyn AnrListener>) -> (ListenerId, usize) {
        let id = ListenerId::new();
        let slot = Arc::new(ReentrantMutex::new(RefCell::new(Some(listener))));

        let mut entries = self.entries.lock();
        entries.push((id, slot));
        (id, entries.len())
    }

    /// Unregister a listener, returning the remaining count if it was present
    ///
    /// Once this returns the listener will not be called again.
    pub(crate) fn remove(&self, id: ListenerId) -> Option<usize> {
        let (slot, remaining) = {
            let mut entries = self.entries.lock();
            let index = entries.iter().position(|(entry_id, _)| *entry_id == id)?;
            let (_, slot) = entries.remove(index);
            (slot, entries.len())
        };

        Self::close(&slot);
        Some(remaining)
    }

    /// Unregister every listener
    pub(crate) fn clear(&self) {
        let drained: Vec<_> = self.entries.lock().drain(..).collect();
        for (_, slot) in drained {
            Self::close(&slot);
        }
    }

    /// Registered listeners that are still alive
    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(_, slot)| is_live(slot))
            .count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `notify` for every registered listener
    pub(crate) fn notify<F>(&self, notify: F)
    where
        F: Fn(&dyn AnrListener),
    {
        let slots: Vec<Arc<Slot>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, slot)| Arc::clone(slot))
            .collect();

        for slot in slots {
            let guard = slot.lock();
            let listener = guard.borrow().as_ref().and_then(Weak::upgrade);
            if let Some(listener) = listener {
                notify(listener.as_ref());
            }
        }

        self.prune();
    }

    fn close(slot: &Slot) {
        let guard = slot.lock();
        guard.borrow_mut().take();
    }

    /// Drop registrations whose listener is gone
    fn prune(&self) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(_, slot)| is_live(slot));

        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} dropped ANR listener(s)", pruned);
        }
    }
}

fn is_live(slot: &Slot) -> bool {
    match slot.try_lock() {
        Some(guard) => {
            let live = guard
                .borrow()
                .as_ref()
                .map_or(false, |weak| weak.strong_count() > 0);
            live
        }
        // Being notified right now
        None => true,
    }
}
