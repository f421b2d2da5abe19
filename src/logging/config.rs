//! Logging settings carried in the `logging` section of `HealthConfig`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing_subscriber::filter::LevelFilter;

/// Verbosity threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive spelling understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, for log shippers
    Json,
}

/// Where events are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard error
    #[default]
    Console,
    /// Rolling files under `LoggingConfig::directory`
    File,
    Both,
}

impl LogOutput {
    pub fn to_console(&self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    pub fn to_file(&self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Directory for rolled log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Per-target overrides, e.g. `"runtime_health::anr" = "debug"`
    #[serde(default)]
    pub targets: BTreeMap<String, LogLevel>,

    /// Tag events with the emitting thread
    ///
    /// Hang notifications arrive on the monitor's worker threads while frame
    /// and startup events come from the host's primary thread.
    #[serde(default)]
    pub thread_ids: bool,

    #[serde(default)]
    pub rotation: RotationStrategy,

    /// Rolled files kept on disk
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runtime-health")
        .join("logs")
}

fn default_max_files() -> usize {
    7
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            output: LogOutput::Console,
            directory: default_log_directory(),
            targets: BTreeMap::new(),
            thread_ids: false,
            rotation: RotationStrategy::Daily,
            max_files: default_max_files(),
        }
    }
}

impl LoggingConfig {
    /// Console output with every probe cycle and sentinel access visible
    pub fn verbose() -> Self {
        let mut targets = BTreeMap::new();
        targets.insert("runtime_health".to_string(), LogLevel::Debug);

        Self {
            level: LogLevel::Info,
            targets,
            thread_ids: true,
            ..Self::default()
        }
    }
}
