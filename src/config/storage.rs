//! Configuration Storage Implementation
//!
//! Provides JSON file-based configuration with:
//! - Per-field defaults so partial files load cleanly
//! - Atomic writes using temp file + rename
//! - Validation of timer intervals before monitoring starts

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::logging::LoggingConfig;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete health monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Hang detection settings
    #[serde(default)]
    pub anr: AnrConfig,

    /// Frame delay settings
    #[serde(default)]
    pub frames: FramesConfig,

    /// Startup sentinel settings
    #[serde(default)]
    pub sentinel: SentinelConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hang detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnrConfig {
    /// How often a liveness probe is issued, in milliseconds
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,

    /// How long a probe may stay unanswered before a hang opens
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Frames rendered during the deadline window at or below which a hang
    /// counts as fully blocking
    #[serde(default = "default_max_frames_for_fully_blocking")]
    pub max_frames_for_fully_blocking: usize,

    /// A deadline that fires later than `timeout * suspension_factor` means
    /// the process was suspended, not hung
    #[serde(default = "default_suspension_factor")]
    pub suspension_factor: f64,
}

fn default_probe_interval() -> u64 {
    400
}

fn default_timeout() -> u64 {
    2000
}

fn default_max_frames_for_fully_blocking() -> usize {
    1
}

fn default_suspension_factor() -> f64 {
    2.0
}

impl Default for AnrConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: default_probe_interval(),
            timeout_ms: default_timeout(),
            max_frames_for_fully_blocking: default_max_frames_for_fully_blocking(),
            suspension_factor: default_suspension_factor(),
        }
    }
}

impl AnrConfig {
    /// Probe interval as a duration
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Hang deadline as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Latest a deadline may fire before the cycle counts as a suspension
    pub fn suspension_limit(&self) -> Duration {
        self.timeout().mul_f64(self.suspension_factor.max(1.0))
    }
}

/// Frame delay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramesConfig {
    /// Ideal frame cadence in microseconds
    #[serde(default = "default_ideal_frame_interval")]
    pub ideal_frame_interval_us: u64,

    /// How long frame samples are retained, in milliseconds
    #[serde(default = "default_retention")]
    pub retention_ms: u64,

    /// Interval above which a frame counts as frozen, in milliseconds
    #[serde(default = "default_frozen_threshold")]
    pub frozen_frame_threshold_ms: u64,

    /// Hard cap on retained samples
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

fn default_ideal_frame_interval() -> u64 {
    16_667 // 60 fps
}

fn default_retention() -> u64 {
    30_000
}

fn default_frozen_threshold() -> u64 {
    700
}

fn default_max_samples() -> usize {
    4096
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            ideal_frame_interval_us: default_ideal_frame_interval(),
            retention_ms: default_retention(),
            frozen_frame_threshold_ms: default_frozen_threshold(),
            max_samples: default_max_samples(),
        }
    }
}

impl FramesConfig {
    /// Configuration for a display refreshing at `fps`
    pub fn for_frame_rate(fps: u32) -> Self {
        Self {
            ideal_frame_interval_us: 1_000_000 / u64::from(fps.max(1)),
            ..Default::default()
        }
    }

    /// Configuration with an explicit ideal cadence
    pub fn with_ideal_interval(interval: Duration) -> Self {
        Self {
            ideal_frame_interval_us: interval.as_micros() as u64,
            ..Default::default()
        }
    }

    /// Ideal cadence as a duration
    pub fn ideal_frame_interval(&self) -> Duration {
        Duration::from_micros(self.ideal_frame_interval_us)
    }

    /// Retention window as a duration
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }

    /// Frozen frame threshold as a duration
    pub fn frozen_frame_threshold(&self) -> Duration {
        Duration::from_millis(self.frozen_frame_threshold_ms)
    }
}

/// Startup sentinel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// File backing the persisted sentinel store
    #[serde(default = "default_sentinel_path")]
    pub path: PathBuf,

    /// Store key owned by the startup watchdog
    #[serde(default = "default_slot")]
    pub slot: String,
}

fn default_sentinel_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runtime-health")
        .join("sentinels.json")
}

fn default_slot() -> String {
    "startup".to_string()
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            path: default_sentinel_path(),
            slot: default_slot(),
        }
    }
}

impl HealthConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: HealthConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path` with an atomic write
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;

        // Write to temp file first
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;

        // Atomic rename
        std::fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Reject values the trackers cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.anr.probe_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "anr.probe_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.anr.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "anr.timeout_ms must be greater than 0".to_string(),
            ));
        }
        if !self.anr.suspension_factor.is_finite() || self.anr.suspension_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "anr.suspension_factor must be >= 1.0, got {}",
                self.anr.suspension_factor
            )));
        }
        if self.frames.ideal_frame_interval_us == 0 {
            return Err(ConfigError::Invalid(
                "frames.ideal_frame_interval_us must be greater than 0".to_string(),
            ));
        }
        if self.frames.max_samples < 2 {
            return Err(ConfigError::Invalid(
                "frames.max_samples must be at least 2".to_string(),
            ));
        }
        if self.sentinel.slot.is_empty() {
            return Err(ConfigError::Invalid(
                "sentinel.slot must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
