//! Logging System
//!
//! Installs the global `tracing` subscriber from a [`LoggingConfig`]:
//! an `EnvFilter` built from the configured levels over a text or JSON
//! formatter writing to stderr, rolling files, or both.

mod config;


pub use config::{LogFormat, LogLevel, LogOutput, LoggingConfig, RotationStrategy};

use std::path::Path;
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// File name prefix for rolled log files
pub const LOG_FILE_NAME: &str = "runtime-health.log";

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Handle to the installed subscriber
///
/// Dropping it flushes and stops the background file writer, so keep it for
/// the life of the process.
pub struct LoggingSystem {
    level: LogLevel,
    file_guard: Option<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber
    ///
    /// Fails if a global subscriber is already set.
    pub fn init(config: &LoggingConfig) -> LoggingResult<Self> {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut file_guard = None;

        if config.output.to_console() {
            layers.push(fmt_layer(config, std::io::stderr, true));
        }
        if config.output.to_file() {
            let (writer, guard) = file_writer(config)?;
            layers.push(fmt_layer(config, writer, false));
            file_guard = Some(guard);
        }

        tracing_subscriber::registry()
            .with(layers)
            .with(env_filter(config))
            .try_init()
            .map_err(|e| LoggingError::InitializationError(e.to_string()))?;

        tracing::debug!(
            "Logging initialized (level: {}, output: {:?}, format: {:?})",
            config.level,
            config.output,
            config.format
        );

        Ok(Self {
            level: config.level,
            file_guard,
        })
    }

    /// Global level the subscriber was installed with
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether events are also going to a log file
    pub fn writes_file(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Filter with the global level plus per-target overrides
///
/// A target that does not parse is given the global level.
pub(crate) fn env_filter(config: &LoggingConfig) -> EnvFilter {
    config
        .targets
        .iter()
        .fold(EnvFilter::new(config.level.as_str()), |filter, (target, level)| {
            let directive = format!("{}={}", target, level)
                .parse::<Directive>()
                .unwrap_or_else(|_| LevelFilter::from(config.level).into());
            filter.add_directive(directive)
        })
}

fn fmt_layer<W>(config: &LoggingConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_ids);

    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Text => layer.boxed(),
    }
}

fn file_writer(config: &LoggingConfig) -> LoggingResult<(NonBlocking, WorkerGuard)> {
    create_directory(&config.directory)?;

    let rotation = match config.rotation {
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
        RotationStrategy::Never => Rotation::NEVER,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(LOG_FILE_NAME)
        .max_log_files(config.max_files.max(1))
        .build(&config.directory)
        .map_err(|e| LoggingError::InitializationError(e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}

fn create_directory(dir: &Path) -> LoggingResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        LoggingError::DirectoryCreationError(format!("{:?}: {}", dir, e))
    })
}
