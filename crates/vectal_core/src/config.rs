//! Runtime configuration for core services.
//!
//! # Responsibility
//! - Collect logging, storage and text-processing knobs in one value.
//! - Load overrides from `VECTAL_*` environment variables.
//!
//! # Invariants
//! - Unset variables keep defaults; malformed ones are errors, not ignored.
//! - `log_level` is always a normalized level token.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use crate::text::preview::{DEFAULT_MAX_HIGHLIGHTS, DEFAULT_PREVIEW_MAX_LENGTH};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "VECTAL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "VECTAL_LOG_DIR";
pub const ENV_DB_PATH: &str = "VECTAL_DB_PATH";
pub const ENV_PREVIEW_MAX_LENGTH: &str = "VECTAL_PREVIEW_MAX_LENGTH";
pub const ENV_MAX_HIGHLIGHTS: &str = "VECTAL_MAX_HIGHLIGHTS";

const NOTES_DEFAULT_LIMIT: u32 = 50;
const NOTES_MAX_LIMIT: u32 = 100;

/// Configuration loading error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
    Logging(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid value `{value}` for {key}: {message}"),
            Self::Logging(err) => write!(f, "logging setup failed: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off if unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file; [`CoreConfig::open_db`] uses memory when unset.
    pub db_path: Option<PathBuf>,
    pub preview_max_length: usize,
    pub max_highlights: usize,
    pub notes_default_limit: u32,
    pub notes_max_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
            preview_max_length: DEFAULT_PREVIEW_MAX_LENGTH,
            max_highlights: DEFAULT_MAX_HIGHLIGHTS,
            notes_default_limit: NOTES_DEFAULT_LIMIT,
            notes_max_limit: NOTES_MAX_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Loads defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads defaults overridden by values from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = normalize_level(&value)
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: value.clone(),
                    message: err.to_string(),
                })?
                .to_string();
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = non_blank(lookup(ENV_PREVIEW_MAX_LENGTH)) {
            config.preview_max_length = parse_positive(ENV_PREVIEW_MAX_LENGTH, &value)?;
        }
        if let Some(value) = non_blank(lookup(ENV_MAX_HIGHLIGHTS)) {
            config.max_highlights = parse_positive(ENV_MAX_HIGHLIGHTS, &value)?;
        }

        Ok(config)
    }

    /// Starts file logging when `log_dir` is configured.
    ///
    /// Returns `Ok(false)` when no directory is set.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        let Some(log_dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        let log_dir = log_dir.to_str().ok_or_else(|| {
            ConfigError::Logging(LoggingError::InvalidDirectory {
                path: log_dir.display().to_string(),
                reason: "path is not UTF-8".to_string(),
            })
        })?;
        init_logging(&self.log_level, log_dir).map_err(ConfigError::Logging)?;
        Ok(true)
    }

    /// Opens the migrated database at `db_path`, or an in-memory one.
    pub fn open_db(&self) -> DbResult<Connection> {
        match self.db_path.as_ref() {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Clamps a requested page size into `1..=notes_max_limit`.
    ///
    /// Missing or zero requests use `notes_default_limit`.
    pub fn effective_notes_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.notes_default_limit.min(self.notes_max_limit),
            Some(value) => value.min(self.notes_max_limit),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        Ok(_) => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Err(err) => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            message: err.to_string(),
        }),
    }
}
