//! Error types for the health monitor
//!
//! Only setup (configuration, logging, runtime lookup) returns these to the
//! caller. Once running, the monitors log probe and sentinel failures and
//! carry on with a conservative default.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;

/// Result type alias for health monitor operations
pub type Result<T> = std::result::Result<T, HealthError>;

/// Main error type for the health monitor
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Sentinel store error: {0}")]
    Sentinel(#[from] SentinelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main-thread liveness probe errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The primary execution context no longer accepts work
    #[error("Primary execution context is unreachable")]
    Unreachable,

    /// The probe was accepted but dropped before it ran
    #[error("Probe dropped before acknowledgment")]
    Dropped,

    #[error("Probe delivery failed: {reason}")]
    DeliveryFailed { reason: String },
}

/// Persisted sentinel store errors
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Sentinel store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Sentinel record corrupted for key {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
