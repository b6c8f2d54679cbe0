//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for results carrying an [`ErrorEnvelope`].
pub trait ResultExt<T> {
    /// Attach a metadata entry to the error, if any.
    fn with_metadata(self, key: &str, value: impl Into<String>) -> Result<T>;

    /// Attach a metadata entry computed lazily, only on the error path.
    fn with_metadata_lazy<F, V>(self, key: &str, value: F) -> Result<T>
    where
        F: FnOnce() -> V,
        V: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_metadata(self, key: &str, value: impl Into<String>) -> Result<T> {
        self.map_err(|error| error.with_metadata(key, value))
    }

    fn with_metadata_lazy<F, V>(self, key: &str, value: F) -> Result<T>
    where
        F: FnOnce() -> V,
        V: Into<String>,
    {
        self.map_err(|error| error.with_metadata(key, value()))
    }
}
