//! Test fixtures for shared error codes and client failures.

use kvscope_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::io;

/// The client-side I/O failure used across instrumentation tests.
pub fn network_timeout() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "network timeout")
}

/// A stats backend failure fixture.
pub fn recording_failed_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("stats", "record_failed"),
        "stats backend unavailable",
        ErrorClass::Retriable,
    )
}

/// A view registration conflict fixture.
pub fn view_conflict_error(view: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("stats", "view_conflict"),
        "a different view is already registered under this name",
    )
    .with_metadata("view", view)
}
