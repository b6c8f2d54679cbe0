//! # kvscope-shared
//!
//! Result and error envelope types used by every kvscope crate.
//!
//! - [`ErrorEnvelope`]: structured error with kind, retry class, namespaced code
//! - [`Result`]: workspace result alias defaulting to [`ErrorEnvelope`]
//!
//! This crate depends only on external crates.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod result;

pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use result::{Result, ResultExt};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
