//! Logging setup: console output plus a timestamped run log file.

use std::path::PathBuf;

use time::format_description;
use time::OffsetDateTime;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Installs the global subscriber: an env-filtered console layer plus a
/// non-blocking file layer writing `provision_<timestamp>.log` into the log
/// directory.
///
/// The returned guard must be kept alive for the duration of the process so
/// buffered log lines are flushed on exit.
pub fn init(log_dir: Option<PathBuf>) -> Result<WorkerGuard, CliError> {
    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir).map_err(|e| {
        CliError::Config(format!(
            "failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let stamp_format = format_description::parse("[year][month][day]_[hour][minute][second]")
        .expect("static log timestamp format");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = now
        .format(&stamp_format)
        .map_err(|e| CliError::Config(format!("failed to format log timestamp: {e}")))?;

    let appender = tracing_appender::rolling::never(&log_dir, format!("provision_{stamp}.log"));
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime::rfc_3339())
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

/// Log directory under the platform data directory.
fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("apkfleet").join("logs"))
        .unwrap_or_else(|| PathBuf::from("apkfleet_logs"))
}
