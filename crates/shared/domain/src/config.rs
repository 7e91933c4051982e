use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration shared across crates.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub registration: RegistrationConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Transaction retry budget of the document store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Attempts per transaction before contention is reported (at least 1).
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles on every further retry.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single backoff.
    pub max_backoff_ms: u64,
}

/// Console/file logging.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Extra filter directives, e.g. `campus_enrollment=debug`.
    pub env_filter: Option<String>,
    pub console: bool,
    /// Directory of the rolling log files; no file output when unset.
    pub path: Option<PathBuf>,
    /// Rotated files kept in `path`.
    pub max_files: usize,
    pub json: bool,
}

/// Registration engine policies.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub dangling_policy: DanglingPolicy,
}

/// What to do with a registered section id that no longer resolves to a section.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Leave the id in place and ignore it during conflict scanning.
    #[default]
    Skip,
    /// Drop the id from the student's set when the request commits a change.
    Prune,
}

// --- Default ---

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { max_attempts: 8, initial_backoff_ms: 5, max_backoff_ms: 250 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            env_filter: None,
            console: true,
            path: None,
            max_files: 10,
            json: false,
        }
    }
}
