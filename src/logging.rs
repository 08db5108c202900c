//! File-based logging for Rhevo Player
//!
//! The console driver owns stdin/stdout for operator commands, so logs go to
//! a rolling file instead.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::PlayerConfig;

const LOG_FILE_PREFIX: &str = "rhevo-player";

/// Initialize the logging system.
///
/// Logs are written to `<log_dir>/rhevo-player.YYYY-MM-DD` with daily rotation.
/// `RUST_LOG` overrides the configured filter.
pub fn init_logging(config: &PlayerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, LOG_FILE_PREFIX);

    // Non-blocking writer
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the guard alive for the lifetime of the application
    Box::leak(Box::new(guard));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(log_dir = %config.log_dir.display(), "Logging initialized");

    Ok(())
}

/// Log the outcome of a best-effort backend call
#[macro_export]
macro_rules! log_backend_result {
    ($operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::debug!(operation = $operation, "Backend call succeeded"),
            Err(e) => tracing::warn!(operation = $operation, error = %e, "Backend call failed, continuing"),
        }
    };
}
