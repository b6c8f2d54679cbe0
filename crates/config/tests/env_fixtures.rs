//! Integration tests for env parsing and env-to-config merging.

use kvscope_config::{
    ConfigFormat, EnvParseError, LogFormat, LogLevel, ObservabilityConfig, ObservabilityEnv,
    apply_env_overrides, load_observability_config_from_sources,
};
use kvscope_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

fn read_env_map(relative: &str) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest_dir
        .join("..")
        .join("testkit")
        .join("fixtures")
        .join(relative);
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[test]
fn env_fixtures_merge_into_effective_config() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/kvscope-env.valid.json")?;
    let env = ObservabilityEnv::from_map(&env_map)?;

    let config = apply_env_overrides(ObservabilityConfig::default(), &env)?;

    assert_eq!(config.method_prefix, "orders");
    assert_eq!(config.logging.level, LogLevel::Error);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(!config.views.register_on_startup);
    assert!(config.export.enabled);
    Ok(())
}

#[test]
fn env_beats_config_file_values() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/kvscope-env.valid.json")?;
    let env = ObservabilityEnv::from_map(&env_map)?;
    let file = "methodPrefix = \"cache\"\n[logging]\nlevel = \"trace\"\nformat = \"json\"\n";

    let config = load_observability_config_from_sources(Some((file, ConfigFormat::Toml)), &env)?;

    assert_eq!(config.method_prefix, "orders");
    assert_eq!(config.logging.level, LogLevel::Error);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    Ok(())
}

#[test]
fn invalid_bool_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/kvscope-env.invalid-bool.json")?;
    let error = ObservabilityEnv::from_map(&env_map)
        .err()
        .ok_or_else(|| std::io::Error::other("expected env error"))?;
    assert!(matches!(error, EnvParseError::InvalidBool { .. }));

    let envelope = ErrorEnvelope::from(error);
    assert_eq!(envelope.code, ErrorCode::new("config", "invalid_env_bool"));
    assert_eq!(
        envelope.metadata.get("value").map(String::as_str),
        Some("sometimes")
    );
    Ok(())
}
