//! Logging configuration using tracing
//!
//! Everything goes to a daily rolling file. The terminal is never written to:
//! it belongs to the TUI, or to the NDJSON stream in headless mode.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Filter directives, e.g. `ROVERDECK_LOG=roverdeck_link=trace`.
pub const LOG_ENV: &str = "ROVERDECK_LOG";

/// Overrides the log directory.
pub const LOG_DIR_ENV: &str = "ROVERDECK_LOG_DIR";

const DEFAULT_FILTER: &str = "roverdeck=info,roverdeck_app=info,roverdeck_link=info,warn";
const LOG_FILE_PREFIX: &str = "roverdeck.log";

/// Initialize the logging subsystem and return the log directory.
///
/// # Examples
/// ```bash
/// ROVERDECK_LOG=debug roverdeck
/// ROVERDECK_LOG=roverdeck_link=trace roverdeck --headless
/// ```
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Rover Deck {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(log_dir)
}

/// `ROVERDECK_LOG_DIR`, else `<data_local_dir>/roverdeck/logs`.
pub fn log_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roverdeck")
        .join("logs")
}

/// Prefix of the rolling log files; each day appends `.YYYY-MM-DD`.
pub fn log_file_prefix() -> PathBuf {
    log_directory().join(LOG_FILE_PREFIX)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_log_directory_override() {
        std::env::set_var(LOG_DIR_ENV, "/tmp/roverdeck-logs");
        assert_eq!(log_directory(), PathBuf::from("/tmp/roverdeck-logs"));
        assert_eq!(
            log_file_prefix(),
            PathBuf::from("/tmp/roverdeck-logs/roverdeck.log")
        );
        std::env::remove_var(LOG_DIR_ENV);
    }

    #[test]
    #[serial]
    fn test_log_directory_default() {
        std::env::remove_var(LOG_DIR_ENV);
        assert!(log_directory().ends_with("roverdeck/logs"));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
