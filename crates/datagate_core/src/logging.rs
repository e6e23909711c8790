//! Structured logging for the gateway process.
//!
//! Console output always; a daily `datagate.<date>.log` file when stdout is not
//! a terminal. Filters come from `DATAGATE_LOG`, then `RUST_LOG`.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, writer::MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
pub struct LogConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Whether running in a PTY (affects output formatting)
    pub is_pty: bool,
    /// Optional custom log filter
    pub log_filter: Option<String>,
}

impl LogConfig {
    /// Create a new logging configuration.
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir, is_pty: atty::is(atty::Stream::Stdout), log_filter: None }
    }
}

/// Guard that must be held for the lifetime of the application.
///
/// Dropping this guard flushes pending log entries.
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Initialize the global subscriber.
///
/// Falls back to console-only output when the log directory is unusable.
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    // Interactive terminal: stdout only
    if config.is_pty {
        return init_stdout_logging(config.log_filter.as_deref());
    }

    match init_file_logging(&config) {
        Ok(guard) => LoggingGuard { _worker_guard: Some(guard) },
        Err(e) => {
            eprintln!("Warning: Failed to initialize file logging: {}. Using console only.", e);
            init_stdout_logging(config.log_filter.as_deref())
        }
    }
}

/// Initialize stdout-only logging.
fn init_stdout_logging(filter: Option<&str>) -> LoggingGuard {
    tracing_subscriber::registry()
        .with(build_env_filter(filter))
        .with(fmt::layer().with_target(false))
        .init();

    LoggingGuard { _worker_guard: None }
}

/// Console plus daily rolling file.
fn init_file_logging(config: &LogConfig) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("datagate")
        .filename_suffix("log")
        .build(&config.log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Console stays at INFO; per-query debug output only reaches the file
    let console = fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stdout.with_max_level(tracing::Level::INFO));
    let file = fmt::layer().with_ansi(false).with_writer(file_writer);

    tracing_subscriber::registry()
        .with(build_env_filter(config.log_filter.as_deref()))
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}

/// Explicit filter, then `DATAGATE_LOG`, then `RUST_LOG`, then the build default.
fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env("DATAGATE_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Default filter for the current build type.
pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "info,datagate=debug,datagate_core=debug,tower_http=debug,tokio_postgres=warn,hyper=warn"
    }
    #[cfg(not(debug_assertions))]
    {
        "warn,datagate=info,datagate_core=info,tower_http=info,tokio_postgres=warn,hyper=warn"
    }
}

/// Default log directory.
///
/// `./datagate_data/logs` in debug builds, the platform data directory
/// otherwise.
pub fn log_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./datagate_data/logs")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_dir()
            .map(|d| d.join("datagate").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./datagate_data/logs"))
    }
}
