//! Named views: a measure, an aggregation, and the tag columns to group by.

use crate::aggregation::Aggregation;
use crate::measure::{MEASURE_DATA_TRANSFERRED, MEASURE_LATENCY_MS, Measure};
use crate::tags::TagKey;
use serde::Serialize;

/// Name of the latency distribution view.
pub const LATENCY_VIEW_NAME: &str = "kvscope/latency";
/// Name of the call count view.
pub const CALLS_VIEW_NAME: &str = "kvscope/calls";
/// Name of the transferred-bytes distribution view.
pub const DATA_TRANSFERRED_VIEW_NAME: &str = "kvscope/data_transferred";

/// Aggregated projection of a measure, grouped by tag columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    name: String,
    description: String,
    measure: Measure,
    aggregation: Aggregation,
    columns: Vec<TagKey>,
}

impl View {
    /// Build a view.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        measure: Measure,
        aggregation: Aggregation,
        columns: Vec<TagKey>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            measure,
            aggregation,
            columns,
        }
    }

    /// View name, unique within a view manager.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Measure the view aggregates.
    #[must_use]
    pub const fn measure(&self) -> &Measure {
        &self.measure
    }

    /// Aggregation applied to samples.
    #[must_use]
    pub const fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// Tag keys the view groups rows by.
    #[must_use]
    pub fn columns(&self) -> &[TagKey] {
        &self.columns
    }
}

fn call_columns() -> Vec<TagKey> {
    vec![TagKey::METHOD, TagKey::ERROR, TagKey::STATUS]
}

/// Latency distribution per method and outcome.
#[must_use]
pub fn latency_view() -> View {
    View::new(
        LATENCY_VIEW_NAME,
        "The distribution of the latencies of various calls",
        MEASURE_LATENCY_MS,
        Aggregation::latency_distribution(),
        call_columns(),
    )
}

/// Number of calls per method and outcome.
#[must_use]
pub fn calls_view() -> View {
    View::new(
        CALLS_VIEW_NAME,
        "The number of various calls of methods",
        MEASURE_LATENCY_MS,
        Aggregation::count(),
        call_columns(),
    )
}

/// Distribution of payload bytes per method and direction.
#[must_use]
pub fn data_transferred_view() -> View {
    View::new(
        DATA_TRANSFERRED_VIEW_NAME,
        "The number of bytes transferred",
        MEASURE_DATA_TRANSFERRED,
        Aggregation::bytes_distribution(),
        vec![TagKey::METHOD, TagKey::DIRECTION],
    )
}

/// The three views, in registration order.
#[must_use]
pub fn all_views() -> [View; 3] {
    [latency_view(), calls_view(), data_transferred_view()]
}
