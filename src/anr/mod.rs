//! ANR Tracker
//!
//! Detects periods where the primary execution context stops responding.
//! A background task periodically posts a liveness probe onto the primary
//! context and waits for it to run. A missed deadline opens a hang, which is
//! classified using frame data and reported to listeners exactly once; the
//! probe's eventual acknowledgment closes it.

mod listener;
mod probe;
mod tracker;

pub use listener::{AnrListener, ListenerId};
pub use probe::{main_queue, MainQueue, MainQueueProbe, MainThreadProbe, ProbeTask};
pub use tracker::AnrTracker;
