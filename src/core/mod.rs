//! Health Monitor Core Module
//!
//! This module contains the shared pieces used by every component:
//! - Error types
//! - Hang and frame data types

pub mod error;
pub mod types;

// Re-export commonly used items
pub use error::{HealthError, ProbeError, Result, SentinelError};
pub use types::*;
