//! # kvscope-ports
//!
//! Capability traits that instrumentation code is written against:
//! stats recording, tagging, tracing, and view registration.
//!
//! This crate depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod stats;
pub mod tags;
pub mod trace;
pub mod views;

pub use stats::*;
pub use tags::*;
pub use trace::*;
pub use views::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without naming `kvscope-domain` for every type.
pub use kvscope_domain::{
    Measure, MeasureValue, SpanStatus, StatusCode, TagContext, TagKey, TagValue, View,
};
