//! Tracing subscriber setup.
//!
//! `RUST_LOG` filters (default `info`), `LOG_FORMAT=json` switches to JSON
//! lines and `LOG_DIR` adds a daily rolling file next to stdout.

use std::{env, sync::OnceLock};

use tracing_appender::{
    non_blocking,
    non_blocking::NonBlocking,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{fmt, time::ChronoLocal, writer::MakeWriterExt},
};

use crate::error::AppError;

/// Guard to ensure buffered logs are flushed on shutdown.
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "valsync.log";

pub fn init() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_level(true);

    match (env::var("LOG_DIR").ok(), json) {
        (Some(dir), true) => {
            let writer = std::io::stdout
                .with_max_level(tracing::Level::INFO)
                .and(init_file_writer(&dir)?);
            builder.json().with_writer(writer).init();
        }
        (Some(dir), false) => {
            let writer = std::io::stdout
                .with_max_level(tracing::Level::INFO)
                .and(init_file_writer(&dir)?);
            builder.with_ansi(false).with_writer(writer).init();
        }
        (None, true) => builder.json().init(),
        (None, false) => builder.with_ansi(true).init(),
    }

    tracing::info!("logger initialized");

    Ok(())
}

fn init_file_writer(dir: &str) -> Result<NonBlocking, AppError> {
    let max_files = env::var("LOG_MAX_FILES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok());

    let mut file_builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX);

    if let Some(n) = max_files {
        file_builder = file_builder.max_log_files(n);
    }

    let file_appender = file_builder
        .build(dir)
        .map_err(|e| AppError::Config(format!("cannot create log file in {dir}: {e}")))?;

    let (file_writer, guard) = non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| AppError::Config("logger initialized twice".into()))?;

    Ok(file_writer)
}
