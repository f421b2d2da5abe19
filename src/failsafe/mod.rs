//! Startup Fail-Safe Watchdog
//!
//! Detects that the previous launch crashed partway through a guarded
//! initialization sequence. Entering the sequence leaves a `Started`
//! sentinel behind; completing it overwrites that with `Succeeded`. A launch
//! that finds `Started` for its own key knows the last attempt never
//! finished.

mod watchdog;

pub use watchdog::{CrashCallback, StartupOutcome, StartupWatchdog};
