//! provides logging helpers

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Directory for rolling log files; stderr only when unset.
pub const LOG_PATH_ENV_VAR: &str = "ISVC_ADMISSION_LOG_PATH";

const LOG_FILE_PREFIX: &str = "isvc-admission.log";

fn env_filter() -> filter::EnvFilter {
    filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// initiate the global tracing subscriber
///
/// Logs go to stderr. When [`LOG_PATH_ENV_VAR`] names a directory, they are
/// also written to a daily-rolling file there; keep the returned guard alive
/// for the lifetime of the process so buffered lines are flushed.
pub fn init() -> Option<WorkerGuard> {
    let stderr_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());

    let log_dir = env::var(LOG_PATH_ENV_VAR).ok().filter(|p| !p.is_empty());
    let Some(log_dir) = log_dir else {
        registry().with(stderr_layer).init();
        return None;
    };

    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(3)
        .build(Path::new(&log_dir))
    {
        Ok(appender) => appender,
        Err(err) => {
            registry().with(stderr_layer).init();
            tracing::warn!(log_dir = %log_dir, "failed to create rolling file appender: {err}");
            return None;
        }
    };
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(env_filter());

    registry().with(stderr_layer).with(file_layer).init();
    Some(file_guard)
}
