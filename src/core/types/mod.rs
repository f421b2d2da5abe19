//! Core data types for the health monitor
//!
//! Hang events, frame samples and delay results shared by the trackers.

pub mod frame;
pub mod hang;

// Re-export commonly used types
pub use frame::{DelayResult, FrameSample, FrameStats};
pub use hang::{AnrStoppedResult, HangEvent, HangType};
