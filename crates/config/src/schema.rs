//! Observability configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims the method prefix before it is checked.

use kvscope_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Method prefix applied when none is configured.
pub const DEFAULT_METHOD_PREFIX: &str = "redis";

const METHOD_PREFIX_MAX_LEN: usize = 64;

/// Top-level observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ObservabilityConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Prefix of every tracked method name (`<prefix>.<command>`).
    pub method_prefix: String,
    /// Log subscriber settings.
    pub logging: LoggingConfig,
    /// View registration settings.
    pub views: ViewsConfig,
    /// View snapshot export settings.
    pub export: ExportConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            method_prefix: DEFAULT_METHOD_PREFIX.to_owned(),
            logging: LoggingConfig::default(),
            views: ViewsConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl ObservabilityConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(
        mut self,
    ) -> Result<ValidatedObservabilityConfig, ConfigSchemaError> {
        self.validate_version()?;
        self.normalize();
        validate_method_prefix(&self.method_prefix)?;
        Ok(ValidatedObservabilityConfig { raw: self })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.method_prefix.trim();
        if trimmed.len() != self.method_prefix.len() {
            self.method_prefix = trimmed.to_owned();
        }
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedObservabilityConfig {
    raw: ObservabilityConfig,
}

impl ValidatedObservabilityConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &ObservabilityConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> ObservabilityConfig {
        self.raw
    }
}

impl AsRef<ObservabilityConfig> for ValidatedObservabilityConfig {
    fn as_ref(&self) -> &ObservabilityConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedObservabilityConfig {
    type Target = ObservabilityConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl Default for ValidatedObservabilityConfig {
    fn default() -> Self {
        Self {
            raw: ObservabilityConfig::default(),
        }
    }
}

/// Parse a config from a JSON string, applying validation and normalization.
pub fn parse_observability_config_json(
    input: &str,
) -> Result<ValidatedObservabilityConfig, ErrorEnvelope> {
    let config: ObservabilityConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a config from a TOML string, applying validation and normalization.
pub fn parse_observability_config_toml(
    input: &str,
) -> Result<ValidatedObservabilityConfig, ErrorEnvelope> {
    let config: ObservabilityConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

// =============================================================================
// LOGGING
// =============================================================================

/// Minimum level emitted by the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Canonical config string, also a valid `EnvFilter` directive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a level from user or env input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Canonical config string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }

    /// Parse a format from user or env input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Log subscriber settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Minimum level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

// =============================================================================
// VIEWS AND EXPORT
// =============================================================================

/// View registration settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ViewsConfig {
    /// Register the latency, calls, and data-transferred views at bootstrap.
    pub register_on_startup: bool,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            register_on_startup: true,
        }
    }
}

/// Destination of exported view snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    /// JSON lines on stderr.
    #[default]
    Stderr,
}

/// View snapshot export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ExportConfig {
    /// Whether snapshots are written on export.
    pub enabled: bool,
    /// Where snapshots go.
    pub target: ExportTarget,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// The method prefix cannot be used in method names.
    InvalidMethodPrefix {
        /// Value provided.
        value: String,
        /// Human readable reason.
        reason: &'static str,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::InvalidMethodPrefix { .. } => ErrorCode::new("config", "invalid_method_prefix"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::InvalidMethodPrefix { reason, .. } => {
                write!(formatter, "methodPrefix {reason}")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::InvalidMethodPrefix { value, .. } => envelope
                .with_metadata("field", "methodPrefix")
                .with_metadata("value", value),
        }
    }
}

fn validate_method_prefix(prefix: &str) -> Result<(), ConfigSchemaError> {
    let reason = if prefix.is_empty() {
        Some("must be non-empty")
    } else if prefix.len() > METHOD_PREFIX_MAX_LEN {
        Some("must be at most 64 bytes")
    } else if !prefix.bytes().all(|byte| byte.is_ascii_graphic()) {
        Some("must be printable ASCII without spaces")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConfigSchemaError::InvalidMethodPrefix {
            value: prefix.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}
