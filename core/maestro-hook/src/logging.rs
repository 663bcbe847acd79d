//! Log setup for the hook binary.
//!
//! Stdout belongs to the conversation, so logs go to a daily file under
//! `~/.maestro/logs/`. Warnings and errors are mirrored to stderr, which the
//! host shows to the operator.

use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILTER_ENV: &str = "MAESTRO_LOG";
const DEBUG_LOG_ENV: &str = "MAESTRO_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "maestro-hook.log";

/// Installs the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init() -> Option<WorkerGuard> {
    let Some(log_dir) = log_dir() else {
        let _ = tracing_subscriber::registry().with(stderr_layer()).try_init();
        return None;
    };

    if let Err(e) = fs_err::create_dir_all(&log_dir) {
        let _ = tracing_subscriber::registry().with(stderr_layer()).try_init();
        tracing::warn!(error = %e, "Log directory unavailable, logging to stderr only");
        return None;
    }

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(file_filter());

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer())
        .try_init();
    Some(guard)
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(LevelFilter::WARN)
}

fn file_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_LOG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".maestro").join("logs"))
}
