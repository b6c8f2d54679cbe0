//! # kvscope-config
//!
//! Configuration schema, validation, and normalization, plus file loading and
//! environment overrides. This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (file + env).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_METHOD_PREFIX, ExportConfig, ExportTarget,
    LogFormat, LogLevel, LoggingConfig, ObservabilityConfig, ValidatedObservabilityConfig,
    ViewsConfig, parse_observability_config_json, parse_observability_config_toml,
};

pub use env::{
    ENV_EXPORT_ENABLED, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_METHOD_PREFIX, ENV_REGISTER_VIEWS,
    EnvParseError, ObservabilityEnv, apply_env_overrides,
};
pub use load::{
    ConfigFormat, load_observability_config_from_path, load_observability_config_from_sources,
    load_observability_config_std_env, to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_shared() {
        assert!(!shared_crate_version().is_empty());
    }
}
