//! Runtime Health - in-process monitoring of application responsiveness
//!
//! This crate provides:
//! - Hang (ANR) detection for the primary execution context, with
//!   classification by frame progress
//! - Frame delay measurement against an ideal cadence
//! - Detection of launches that crashed during a guarded startup sequence
//! - A persisted sentinel store backing the startup watchdog

pub mod anr;
pub mod config;
pub mod core;
pub mod failsafe;
pub mod frames;
pub mod logging;
pub mod monitor;
pub mod sentinel;

// Re-export commonly used items
pub use anr::{main_queue, AnrListener, AnrTracker, ListenerId, MainQueue, MainThreadProbe};
pub use config::HealthConfig;
pub use core::error::{HealthError, Result};
pub use core::types::{AnrStoppedResult, DelayResult, HangType};
pub use failsafe::{StartupOutcome, StartupWatchdog};
pub use frames::FrameDelayTracker;
pub use monitor::HealthMonitor;
pub use sentinel::{FileStore, MemoryStore, SentinelStore};
