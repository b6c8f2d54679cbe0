//! # kvscope-domain
//!
//! Pure vocabulary for instrumenting key-value store calls:
//!
//! - **Measures** - `MEASURE_LATENCY_MS`, `MEASURE_DATA_TRANSFERRED`
//! - **Tags** - `TagKey`, `TagValue`, `TagContext`
//! - **Aggregations** - `Aggregation`, `BucketBoundaries`
//! - **Views** - the latency, calls, and data-transferred views
//! - **States** - `SpanStatus`, `OperationState`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No metrics or tracing backend; definitions are plain data

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use kvscope_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod aggregation;
pub mod measure;
pub mod states;
pub mod tags;
pub mod view;

pub use aggregation::{
    Aggregation, BYTE_BOUNDARIES, BoundariesError, BucketBoundaries, LATENCY_BOUNDARIES_MS,
};
pub use measure::{
    DATA_TRANSFERRED_MEASURE_NAME, LATENCY_MEASURE_NAME, MEASURE_DATA_TRANSFERRED,
    MEASURE_LATENCY_MS, Measure, MeasureKind, MeasureValue, UNIT_BYTES, UNIT_MILLISECONDS,
};
pub use states::{OperationState, SpanStatus, StatusCode};
pub use tags::{MAX_TAG_LENGTH, TagContext, TagError, TagKey, TagValue};
pub use view::{
    CALLS_VIEW_NAME, DATA_TRANSFERRED_VIEW_NAME, LATENCY_VIEW_NAME, View, all_views, calls_view,
    data_transferred_view, latency_view,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
