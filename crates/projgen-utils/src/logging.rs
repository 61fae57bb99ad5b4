//! # Logging Utilities
//!
//! Logging setup for projgen on top of `tracing`.
//!
//! Library crates only emit events through the `tracing` macros. Binaries and
//! test harnesses that want to see them call one of the initialisers here,
//! which install a `tracing-subscriber` registry with:
//! - an `EnvFilter` (from `RUST_LOG` or an explicit level)
//! - pretty or JSON formatting with RFC 3339 timestamps
//! - optional daily-rolled file output via `tracing-appender`
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g. `RUST_LOG=projgen_core=debug`)
//! - `PROJGEN_LOG_FORMAT`: `pretty` (default) or `json`
//! - `PROJGEN_LOG_FILE`: optional log file path; logs are mirrored there
//! - `PROJGEN_LOG_DIR`: directory for a date-prefixed log file, used when
//!   `PROJGEN_LOG_FILE` is not set
//!
//! ## Example
//!
//! ```rust,no_run
//! use projgen_utils::{init_logging_with_level, LogFormat, LogLevel};
//!
//! let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty).expect("logging");
//! tracing::debug!("generator starting");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable, multi-field lines (default)
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "text" => Ok(LogFormat::Pretty),
            "json" | "prod" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig
{
    /// Level used when no filter directives are given
    pub level: Level,
    /// Raw `EnvFilter` directives; take precedence over `level`
    pub directives: Option<String>,
    pub format: LogFormat,
    /// Mirror events into this file (rolled daily)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig
{
    fn default() -> Self
    {
        Self {
            level: Level::INFO,
            directives: None,
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LoggingConfig
{
    /// Read `RUST_LOG`, `PROJGEN_LOG_FORMAT`, `PROJGEN_LOG_FILE` and
    /// `PROJGEN_LOG_DIR`.
    ///
    /// Unparseable format values fall back to [`LogFormat::Pretty`].
    #[must_use]
    pub fn from_env() -> Self
    {
        let format = env::var("PROJGEN_LOG_FORMAT")
            .ok()
            .and_then(|s| LogFormat::from_str(&s).ok())
            .unwrap_or(LogFormat::Pretty);

        Self {
            level: Level::INFO,
            directives: env::var("RUST_LOG").ok().filter(|s| !s.trim().is_empty()),
            format,
            file: env::var("PROJGEN_LOG_FILE")
                .ok()
                .map(PathBuf::from)
                .or_else(|| env::var("PROJGEN_LOG_DIR").ok().map(|dir| dated_log_path(Path::new(&dir)))),
        }
    }

    fn filter(&self) -> Result<EnvFilter, LoggingError>
    {
        match &self.directives {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|err| LoggingError::InvalidLevel(format!("{directives}: {err}")))
            }
            None => Ok(EnvFilter::new(self.level.to_string())),
        }
    }
}

/// Keeps the background file writer alive.
///
/// Buffered lines are flushed when this is dropped, so hold it for the
/// lifetime of the program.
#[must_use = "dropping the guard stops the background log writer"]
#[derive(Debug, Default)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialise logging from the environment.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or `RUST_LOG`
/// contains invalid directives.
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(&LoggingConfig::from_env())
}

/// Initialise logging with an explicit level and format, ignoring `RUST_LOG`.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(&LoggingConfig {
        level: level.into(),
        format,
        ..LoggingConfig::default()
    })
}

/// Initialise logging from a resolved [`LoggingConfig`].
///
/// ## Errors
///
/// Returns an error if the filter is invalid, the log file directory cannot
/// be created, or a global subscriber is already installed.
pub fn init_logging_with(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![format_layer(config.format, io::stderr, true, config.filter()?)];
    let mut guard = LoggingGuard::default();

    if let Some(path) = &config.file {
        let (directory, file_name) = split_log_path(path)?;
        std::fs::create_dir_all(&directory)?;
        let appender = tracing_appender::rolling::daily(directory, file_name);
        let (writer, worker) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(config.format, writer, false, config.filter()?));
        guard._file = Some(worker);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => base.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// `<directory>/<YYYY-MM-DD>-projgen.log` for today's UTC date.
pub fn dated_log_path(directory: &Path) -> PathBuf
{
    let today = Utc::now().format("%Y-%m-%d");
    directory.join(format!("{today}-projgen.log"))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailed(format!("log path {} has no file name", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, PathBuf::from(file_name)))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Invalid log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    #[error("Invalid log level or filter: {0}")]
    InvalidLevel(String),

    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Pretty);
        assert!(matches!(LogFormat::from_str("xml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_invalid_directives_rejected()
    {
        let config = LoggingConfig {
            directives: Some("projgen_core=notalevel".to_string()),
            ..LoggingConfig::default()
        };
        assert!(matches!(config.filter(), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_split_log_path()
    {
        let (dir, file) = split_log_path(Path::new("logs/projgen.log")).unwrap();
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(file, PathBuf::from("projgen.log"));

        let (dir, _) = split_log_path(Path::new("projgen.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
    }

    #[test]
    fn test_dated_log_path()
    {
        let path = dated_log_path(Path::new("logs"));
        assert_eq!(path.parent(), Some(Path::new("logs")));

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-projgen.log"));
        assert_eq!(name.len(), "YYYY-MM-DD-projgen.log".len());
        assert!(chrono::NaiveDate::parse_from_str(&name[..10], "%Y-%m-%d").is_ok());
    }
}
