//! Tracing subscriber setup used by the binary.
//!
//! `LOG_FORMAT=json` switches the line format and `LOG_DIR` adds a daily
//! rolling file next to stdout. The two combine.

use std::{env, sync::OnceLock};

use tracing_appender::{
    non_blocking,
    non_blocking::NonBlocking,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        fmt,
        time::ChronoLocal,
        writer::{MakeWriter, MakeWriterExt},
    },
};

use crate::error::AppError;

/// Guard to ensure buffered logs are flushed on shutdown.
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LogSettings {
    json: bool,
    dir: Option<String>,
    max_files: Option<usize>,
}

impl LogSettings {
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            json: var("LOG_FORMAT").is_some_and(|v| v.trim().eq_ignore_ascii_case("json")),
            dir: var("LOG_DIR").filter(|dir| !dir.trim().is_empty()),
            max_files: var("LOG_MAX_FILES").and_then(|v| v.trim().parse().ok()),
        }
    }
}

pub fn init() -> Result<(), AppError> {
    let settings = LogSettings::from_vars(|key| env::var(key).ok());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_level(true);

    match (settings.json, settings.dir.as_deref()) {
        (true, Some(dir)) => builder
            .json()
            .with_writer(stdout_and_file(dir, settings.max_files)?)
            .init(),
        (true, None) => builder.json().init(),
        (false, Some(dir)) => builder
            .with_ansi(false)
            .with_writer(stdout_and_file(dir, settings.max_files)?)
            .init(),
        (false, None) => builder.with_ansi(true).init(),
    }

    tracing::info!(
        json = settings.json,
        log_dir = settings.dir.as_deref(),
        "logger initialized"
    );
    Ok(())
}

fn stdout_and_file(
    dir: &str,
    max_files: Option<usize>,
) -> Result<impl for<'a> MakeWriter<'a> + Send + Sync + 'static, AppError> {
    let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);
    Ok(stdout.and(init_file_writer(dir, max_files)?))
}

fn init_file_writer(dir: &str, max_files: Option<usize>) -> Result<NonBlocking, AppError> {
    let mut file_builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("riftscout.log");

    if let Some(n) = max_files {
        file_builder = file_builder.max_log_files(n);
    }

    let file_appender = file_builder
        .build(dir)
        .map_err(|e| AppError::Config(format!("failed to create log file in {dir}: {e}")))?;

    let (file_writer, guard) = non_blocking(file_appender);

    if LOG_GUARD.set(guard).is_err() {
        return Err(AppError::Config("logger already initialized".into()));
    }

    Ok(file_writer)
}
