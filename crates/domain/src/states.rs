//! Span status and tracking lifecycle states.

use serde::Serialize;

/// Canonical status code carried by a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// No status was set.
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed with an error of unknown category.
    Unknown,
}

impl StatusCode {
    /// Lowercase name used by span exporters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Ok => "ok",
            Self::Unknown => "unknown",
        }
    }
}

/// Status of a span: a code and an optional description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanStatus {
    /// Status code.
    pub code: StatusCode,
    /// Free-form description, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SpanStatus {
    /// Successful status without description.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            description: None,
        }
    }

    /// Failure status of unknown category with a description.
    #[must_use]
    pub fn unknown(description: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Unknown,
            description: Some(description.into()),
        }
    }

    /// Returns true when the status reports a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.code, StatusCode::Unknown)
    }
}

impl Default for SpanStatus {
    fn default() -> Self {
        Self {
            code: StatusCode::Unset,
            description: None,
        }
    }
}

/// Lifecycle of a tracking operation: created `Active`, finalized into `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Span open, nothing recorded yet.
    Active,
    /// Measurements recorded (or attempted) and span ended.
    Ended,
}

impl OperationState {
    /// Returns true once the operation has been finalized.
    #[must_use]
    pub const fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }
}
