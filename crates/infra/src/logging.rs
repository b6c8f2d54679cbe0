//! Process-wide `tracing` subscriber setup.

use kvscope_config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Env var whose directives replace the configured level.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Build the level filter: `rust_log` directives when present and valid,
/// otherwise the configured level.
pub fn env_filter(level: LogLevel, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber, writing to stderr.
///
/// Returns `false` when a global subscriber was already set, in which case
/// the existing one is left untouched.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let rust_log = std::env::var(RUST_LOG_ENV).ok();
    let filter = env_filter(config.level, rust_log.as_deref());
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.is_ok()
}
