//! Stats recording boundary contract.

use kvscope_domain::{Measure, MeasureValue, TagContext};
use kvscope_shared::Result;

/// One value put into a measure map.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Measure the value belongs to.
    pub measure: Measure,
    /// Recorded value.
    pub value: MeasureValue,
}

impl Measurement {
    /// Pair a measure with a value.
    #[must_use]
    pub const fn new(measure: Measure, value: MeasureValue) -> Self {
        Self { measure, value }
    }
}

/// Batch of measurements recorded together under one tag context.
///
/// Every `put` is kept, including repeated puts of the same measure.
pub trait MeasureMap: Send {
    /// Add a value. Returns the map for chaining.
    fn put(&mut self, measure: &Measure, value: MeasureValue) -> &mut dyn MeasureMap;

    /// Record all values with the given tags.
    fn record(self: Box<Self>, tags: &TagContext) -> Result<()>;
}

/// Boundary contract for a stats backend.
pub trait StatsRecorder: Send + Sync {
    /// Start an empty measure map.
    fn new_measure_map(&self) -> Box<dyn MeasureMap>;
}
