//! Environment variable parsing and env-to-config merging.
//!
//! Parsing is strict: a variable that is present but empty or malformed fails
//! instead of being ignored.

use crate::schema::{LogFormat, LogLevel, ObservabilityConfig, ValidatedObservabilityConfig};
use kvscope_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: method prefix.
pub const ENV_METHOD_PREFIX: &str = "KVSCOPE_METHOD_PREFIX";
/// Env var: log level.
pub const ENV_LOG_LEVEL: &str = "KVSCOPE_LOG_LEVEL";
/// Env var: log format (`pretty` or `json`).
pub const ENV_LOG_FORMAT: &str = "KVSCOPE_LOG_FORMAT";
/// Env var: register views at bootstrap.
pub const ENV_REGISTER_VIEWS: &str = "KVSCOPE_REGISTER_VIEWS";
/// Env var: enable view snapshot export.
pub const ENV_EXPORT_ENABLED: &str = "KVSCOPE_EXPORT_ENABLED";

const ENV_VARS: [&str; 5] = [
    ENV_METHOD_PREFIX,
    ENV_LOG_LEVEL,
    ENV_LOG_FORMAT,
    ENV_REGISTER_VIEWS,
    ENV_EXPORT_ENABLED,
];

/// Parsed env overrides; `None` leaves the file or default value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityEnv {
    /// Override for `methodPrefix`.
    pub method_prefix: Option<String>,
    /// Override for `logging.level`.
    pub log_level: Option<LogLevel>,
    /// Override for `logging.format`.
    pub log_format: Option<LogFormat>,
    /// Override for `views.registerOnStartup`.
    pub register_views: Option<bool>,
    /// Override for `export.enabled`.
    pub export_enabled: Option<bool>,
}

impl ObservabilityEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            method_prefix: parse_optional_trimmed_string(map, ENV_METHOD_PREFIX)?,
            log_level: parse_optional_enum(map, ENV_LOG_LEVEL, LogLevel::parse)?,
            log_format: parse_optional_enum(map, ENV_LOG_FORMAT, LogFormat::parse)?,
            register_views: parse_optional_bool(map, ENV_REGISTER_VIEWS)?,
            export_enabled: parse_optional_bool(map, ENV_EXPORT_ENABLED)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map: BTreeMap<String, String> = ENV_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| ((*name).to_owned(), value))
            })
            .collect();
        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: ObservabilityConfig,
    env: &ObservabilityEnv,
) -> Result<ValidatedObservabilityConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(prefix) = &env.method_prefix {
        config.method_prefix.clone_from(prefix);
    }
    if let Some(level) = env.log_level {
        config.logging.level = level;
    }
    if let Some(format) = env.log_format {
        config.logging.format = format;
    }
    if let Some(register) = env.register_views {
        config.views.register_on_startup = register;
    }
    if let Some(enabled) = env.export_enabled {
        config.export.enabled = enabled;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidBool { var, value } | EnvParseError::InvalidEnum { var, value } => {
                envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", value)
            },
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<String>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed.to_owned()))
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool { var, value: raw }),
    }
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    parse(&raw)
        .map(Some)
        .ok_or(EnvParseError::InvalidEnum { var, value: raw })
}
