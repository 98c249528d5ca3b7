//! Process-wide file logging.
//!
//! # Responsibility
//! - Start size-rotated file logs on first use.
//! - Route panics into the log as one-line events.
//!
//! # Invariants
//! - Starting twice with the same target is a no-op; a different target is
//!   a `Conflict`.
//! - Nothing here panics.
//! - Events carry ids, counts and durations; note bodies and search text
//!   stay out of the log.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const FILE_BASENAME: &str = "vectal";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_FILES: usize = 7;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Logging setup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory { path: String, reason: String },
    /// flexi_logger refused to start.
    Backend(String),
    /// Logging is already running with another target.
    Conflict { active: LogTarget, requested: LogTarget },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDirectory { path, reason } => {
                write!(f, "invalid log directory `{path}`: {reason}")
            }
            Self::Backend(message) => write!(f, "logger backend failed: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already running as {active}; cannot switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {}

/// Level plus directory a logger writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub level: &'static str,
    pub dir: PathBuf,
}

impl LogTarget {
    /// Validates raw inputs; `dir` must be absolute.
    pub fn parse(level: &str, dir: &str) -> Result<Self, LoggingError> {
        let level = normalize_level(level)?;
        let trimmed = dir.trim();
        let invalid = |reason: &str| LoggingError::InvalidDirectory {
            path: trimmed.to_string(),
            reason: reason.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid("empty path"));
        }
        if !Path::new(trimmed).is_absolute() {
            return Err(invalid("path must be absolute"));
        }
        Ok(Self {
            level,
            dir: PathBuf::from(trimmed),
        })
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.level, self.dir.display())
    }
}

struct ActiveLogger {
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` under the absolute directory `log_dir`.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let requested = LogTarget::parse(level, log_dir)?;
    let active = ACTIVE.get_or_try_init(|| start(requested.clone()))?;
    if active.target == requested {
        Ok(())
    } else {
        Err(LoggingError::Conflict {
            active: active.target.clone(),
            requested,
        })
    }
}

/// Target of the running logger, if any.
pub fn logging_status() -> Option<LogTarget> {
    ACTIVE.get().map(|active| active.target.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    let level = level.trim().to_ascii_lowercase();
    let normalized = match level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => return Err(LoggingError::UnsupportedLevel(level)),
    };
    Ok(normalized)
}

fn start(target: LogTarget) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&target.dir).map_err(|err| LoggingError::InvalidDirectory {
        path: target.dir.display().to_string(),
        reason: err.to_string(),
    })?;

    let handle = Logger::try_with_str(target.level)
        .and_then(|logger| {
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(target.dir.as_path())
                        .basename(FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        })
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    route_panics_to_log();
    info!(
        "event=core_init module=logging status=ok os={} version={} target={target}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
    );

    Ok(ActiveLogger {
        target,
        _handle: handle,
    })
}

fn route_panics_to_log() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let location = panic
            .location()
            .map_or_else(|| "unknown".to_string(), |at| format!("{}:{}", at.file(), at.line()));
        error!(
            "event=panic module=logging status=error location={location} payload={}",
            panic_text(panic)
        );
        chained(panic);
    }));
}

fn panic_text(panic: &PanicHookInfo<'_>) -> String {
    let payload = panic.payload();
    let raw = if let Some(text) = payload.downcast_ref::<&str>() {
        *text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "<opaque payload>"
    };
    single_line(raw, PANIC_TEXT_LIMIT)
}

// Panic text can quote user input.
fn single_line(text: &str, limit: usize) -> String {
    let mut flat: String = text
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .take(limit)
        .collect();
    if text.chars().nth(limit).is_some() {
        flat.push_str("...");
    }
    flat
}
