//! Tracing setup: human-readable stderr plus JSON lines in `logs/core.log`

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "aether=info,tower_http=info";
pub const LOG_FILE: &str = "core.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global subscriber. The returned guard flushes the file
/// writer when dropped and must live until the process exits. If the log
/// directory cannot be opened, logging continues on stderr only.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let appender = std::fs::create_dir_all(logs_dir)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_FILE)
                .build(logs_dir)
                .map_err(|e| e.to_string())
        });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(writer))
                .init();
            Some(guard)
        }
        Err(e) => {
            init_stderr();
            tracing::warn!("file logging disabled, cannot open {}: {}", logs_dir.display(), e);
            None
        }
    }
}

/// Stderr only, for short-lived subcommands.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
