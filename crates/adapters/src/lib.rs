//! # kvscope-adapters
//!
//! Adapter implementations for ports (in-process stats, `tracing` spans,
//! tagging, JSON export) and the instrumented redis connection.
//! This crate depends on `app`, `ports`, `domain`, and `shared`.

pub mod connection;
pub mod exporter;
pub mod log_sink;
pub mod stats;
pub mod tagger;
pub mod tracer;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use connection::{DEFAULT_METHOD_PREFIX, KeySpec, TracedConnection};
pub use exporter::JsonViewExporter;
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use stats::{AggregationData, DistributionData, InMemoryStats, StatsError, ViewData, ViewRow};
pub use tagger::DefaultTagger;
pub use tracer::{TracingSpan, TracingTracer};
