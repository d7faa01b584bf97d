//! Tracing setup for Flvdeck
//!
//! Console logs follow the user's chosen level. The last-run file keeps the
//! deck's own trace plus every call made against the playback engine, so the
//! teardown order of a player can be checked after the fact. HTTP stack
//! chatter stays at `info` in the file.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name of the per-run log inside the logs directory.
pub const LAST_RUN_LOG: &str = "flvdeck-last-run.log";

/// Target used by engine implementations for per-call logging.
pub const ENGINE_TARGET: &str = "flvdeck::engine";

const FILE_DIRECTIVES: &str = "info,flvdeck_core=trace,flvdeck=trace,flvdeck::engine=trace";

/// Console filter: `RUST_LOG` when set, otherwise the CLI level with engine
/// calls held back unless the user asked for debug output.
fn console_filter(level: Level) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let engine_level = if level >= Level::DEBUG { level } else { Level::WARN };
    EnvFilter::new(format!("{level},{ENGINE_TARGET}={engine_level}"))
}

fn file_filter() -> EnvFilter {
    EnvFilter::new(FILE_DIRECTIVES)
}

/// Path of the last-run log for `logs_dir`, `./logs` when unset.
pub fn last_run_log_path(logs_dir: Option<&Path>) -> PathBuf {
    logs_dir.unwrap_or_else(|| Path::new("logs")).join(LAST_RUN_LOG)
}

/// Installs the console and last-run file subscribers.
///
/// The log file is truncated on every run.
///
/// # Errors
///
/// - `std::io::Error` - If the logs directory or log file cannot be created, or
///   a global subscriber is already installed
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> std::io::Result<()> {
    let log_file_path = last_run_log_path(logs_dir);
    if let Some(dir) = log_file_path.parent() {
        create_dir_all(dir)?;
    }
    let log_file = File::create(&log_file_path)?;

    let console_layer = fmt::layer()
        .with_target(console_level >= Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_filter(console_filter(console_level));

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(file_filter());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(std::io::Error::other)?;

    tracing::debug!(
        console = %console_level,
        log_file = %log_file_path.display(),
        "Tracing initialized"
    );

    Ok(())
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use flvdeck_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for CliLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(CliLogLevel::Error),
            "warn" => Ok(CliLogLevel::Warn),
            "info" => Ok(CliLogLevel::Info),
            "debug" => Ok(CliLogLevel::Debug),
            "trace" => Ok(CliLogLevel::Trace),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_writes_last_run_log() {
        let logs = tempfile::tempdir().unwrap();

        init_tracing(Level::DEBUG, Some(logs.path())).unwrap();

        assert!(last_run_log_path(Some(logs.path())).exists());
    }

    #[test]
    fn test_default_log_path_is_under_logs() {
        assert_eq!(
            last_run_log_path(None),
            Path::new("logs").join(LAST_RUN_LOG)
        );
    }

    #[test]
    fn test_filter_directives_parse() {
        assert!(FILE_DIRECTIVES.parse::<EnvFilter>().is_ok());
        let console = format!("{},{ENGINE_TARGET}={}", Level::INFO, Level::WARN);
        assert!(console.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn test_log_level_parsing_is_case_insensitive() {
        assert_eq!("WARN".parse::<CliLogLevel>(), Ok(CliLogLevel::Warn));
        assert_eq!("trace".parse::<CliLogLevel>(), Ok(CliLogLevel::Trace));
        assert!("loud".parse::<CliLogLevel>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for level in [CliLogLevel::Error, CliLogLevel::Debug] {
            assert_eq!(level.to_string().parse::<CliLogLevel>(), Ok(level));
        }
    }
}
