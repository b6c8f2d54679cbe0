//! # kvscope-facade
//!
//! Public API for consumers.
//! This crate depends on `infra`, `adapters`, `app`, and `config`.

use std::collections::BTreeMap;
use std::path::Path;

pub use kvscope_adapters::{
    DEFAULT_METHOD_PREFIX, DefaultTagger, InMemoryStats, JsonViewExporter, KeySpec, LogSink,
    MemoryLogSink, StderrLogSink, TracedConnection, TracingTracer, ViewData, ViewRow,
};
pub use kvscope_app::{
    ObservabilityDeps, TrackingOperation, default_deps, default_view_manager, defaults_installed,
    install_defaults, instrument, instrument_with, register_all_views, register_all_views_default,
};
pub use kvscope_config::{
    ConfigFormat, LogFormat, LogLevel, ObservabilityConfig, ObservabilityEnv,
    ValidatedObservabilityConfig,
};
pub use kvscope_domain::{
    Aggregation, BucketBoundaries, CALLS_VIEW_NAME, DATA_TRANSFERRED_VIEW_NAME, LATENCY_VIEW_NAME,
    Measure, SpanStatus, TagKey, TagValue, View,
};
pub use kvscope_infra::{Runtime, bootstrap};
pub use kvscope_ports::{Span, StatsRecorder, Tagger, Tracer, ViewManager};
pub use kvscope_shared::{ErrorEnvelope, Result};

/// Returns the facade crate version.
#[must_use]
pub const fn facade_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Load the effective config from an optional file plus the process environment,
/// then bootstrap it.
pub fn init(config_path: Option<&Path>) -> Result<Runtime> {
    let config = kvscope_config::load_observability_config_std_env(config_path)?;
    bootstrap(&config)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
///
/// `env` stands in for the process environment.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> Result<String> {
    let env = ObservabilityEnv::from_map(env)?;
    let config = kvscope_config::load_observability_config_from_path(config_path, &env)?;
    kvscope_config::to_pretty_json(config.as_ref())
}

/// Open a client connection to `url` and wrap it with the runtime's backends.
pub fn connect(runtime: &Runtime, url: &str) -> Result<TracedConnection<redis::Connection>> {
    let connection = redis::Client::open(url)
        .and_then(|client| client.get_connection())
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                kvscope_shared::ErrorCode::new("facade", "connect_failed"),
                format!("failed to connect: {error}"),
                kvscope_shared::ErrorClass::Retriable,
            )
            .with_metadata("url", url)
        })?;
    Ok(runtime.wrap(connection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_config::ENV_METHOD_PREFIX;

    #[test]
    fn facade_crate_compiles() {
        assert!(!facade_crate_version().is_empty());
    }

    #[test]
    fn effective_config_applies_env_map() -> Result<()> {
        let env = BTreeMap::from([(ENV_METHOD_PREFIX.to_owned(), "orders".to_owned())]);
        let json = load_effective_config_json(&env, None)?;
        assert!(json.contains("\"methodPrefix\": \"orders\""));
        assert!(json.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn effective_config_rejects_bad_env() {
        let env = BTreeMap::from([(ENV_METHOD_PREFIX.to_owned(), "   ".to_owned())]);
        let result = load_effective_config_json(&env, None);
        assert!(result.is_err_and(|error| error.has_code("config", "empty_env_var")));
    }

    #[test]
    fn unreachable_url_is_reported() -> Result<()> {
        let config = ValidatedObservabilityConfig::default();
        let runtime = Runtime::build(config, std::sync::Arc::new(MemoryLogSink::new()))?;
        let result = connect(&runtime, "not a url");
        assert!(result.is_err_and(|error| error.has_code("facade", "connect_failed")));
        Ok(())
    }
}
