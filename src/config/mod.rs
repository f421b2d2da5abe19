//! Configuration Module for the health monitor
//!
//! Provides persistent configuration storage with:
//! - JSON file-based storage
//! - Defaults for every missing field
//! - Validation before any tracker starts

mod storage;

pub use storage::{
    AnrConfig, ConfigError, ConfigResult, FramesConfig, HealthConfig, SentinelConfig,
};
