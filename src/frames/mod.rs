//! Frame Delay Tracker
//!
//! Quantifies how far frame presentation lags an ideal cadence. The
//! rendering pipeline records one timestamp per frame; the hang tracker and
//! reporting layers query delay over a window.

mod tracker;
#[cfg(test)]
mod tests;

pub use tracker::FrameDelayTracker;
