//! # Logger
//!
//! Installs the process-wide `tracing` subscriber of a campus binary from the
//! `[logging]` section of its configuration. Output goes to a compact console
//! layer, to rolling files in `logging.path` (plain or JSON lines, written by a
//! non-blocking worker), or to both. Filtering combines `logging.level`, the
//! optional `logging.env_filter` directives and `RUST_LOG`.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use campus_domain::config::LoggingConfig;
//! # use campus_logger::Logger;
//! # fn main() -> Result<(), campus_logger::LoggerError> {
//! let config = LoggingConfig { level: "debug".to_owned(), ..LoggingConfig::default() };
//! let _logger = Logger::from_config("campus", &config)?;
//! # Ok(())
//! # }
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use campus_domain::config::LoggingConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Output plan for the global subscriber.
///
/// Start from [`LoggerBuilder::from_config`] and override single knobs before
/// [`LoggerBuilder::init`]. Rotation, retention and JSON only apply once a log
/// directory is set.
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    directives: Option<String>,
    console: bool,
    dir: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl LoggerBuilder {
    /// Builder seeded from a logging section.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] when `level` is not a tracing level.
    pub fn from_config(name: impl Into<String>, config: &LoggingConfig) -> Result<Self, LoggerError> {
        let level = LevelFilter::from_str(config.level.trim()).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("Unknown log level '{}': {e}", config.level).into(),
                context: None,
            }
        })?;

        Ok(Self {
            name: name.into(),
            level,
            directives: config.env_filter.clone(),
            console: config.console,
            dir: config.path.clone(),
            rotation: Rotation::DAILY,
            max_files: config.max_files,
            json: config.json,
        })
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Writes rolling files named `<name>.<date>.log` into `dir`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn file(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero retention
    ///   with file output, unparsable directives or when no output is enabled.
    /// * [`LoggerError::Subscriber`] if this process already has a global subscriber.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;
        let filter = self.filter()?;

        let mut layers: Vec<BoxedLayer> = Vec::new();
        if self.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }
        let guard = match &self.dir {
            Some(dir) => {
                let (file_layer, guard) = self.file_layer(dir)?;
                layers.push(file_layer);
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        let invalid = |message: &'static str| -> Result<(), LoggerError> {
            Err(LoggerError::InvalidConfiguration { message: message.into(), context: None })
        };

        if self.name.trim().is_empty() {
            return invalid("Logger name cannot be empty");
        }
        if !self.console && self.dir.is_none() {
            return invalid("No logging output enabled. Enable the console or set a log path.");
        }
        if self.dir.is_some() && self.max_files == 0 {
            return invalid("max_files must be greater than zero");
        }
        Ok(())
    }

    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.directives {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => builder.parse(directives).map_err(|e| {
                LoggerError::InvalidConfiguration {
                    message: format!("Invalid env filter '{directives}': {e}").into(),
                    context: None,
                }
            }),
        }
    }

    fn file_layer(&self, dir: &Path) -> Result<(BoxedLayer, WorkerGuard), LoggerError> {
        fs::create_dir_all(dir).map_err(|e| LoggerError::Internal {
            message: e.to_string().into(),
            context: Some(format!("Failed to create path: {}", dir.display()).into()),
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(&self.name)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(dir)
            .context(format!("Log directory {}", dir.display()))?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        let base = layer().with_writer(writer).with_ansi(false);
        let boxed = if self.json { base.json().boxed() } else { base.boxed() };

        Ok((boxed, guard))
    }
}

/// The installed logging system.
///
/// Keep it alive until shutdown: it owns the file worker, which flushes on drop.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Installs the subscriber described by a logging section.
    ///
    /// # Errors
    /// See [`LoggerBuilder::from_config`] and [`LoggerBuilder::init`].
    pub fn from_config(name: impl Into<String>, config: &LoggingConfig) -> Result<Self, LoggerError> {
        LoggerBuilder::from_config(name, config)?.init()
    }

    /// The file worker guard, present when file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Flushing log files");
        }
    }
}
