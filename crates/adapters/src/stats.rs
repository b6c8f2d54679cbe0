//! In-process stats backend: view registry plus aggregation.

use kvscope_domain::{
    Aggregation, BucketBoundaries, Measure, MeasureValue, TagContext, TagValue, View,
};
use kvscope_ports::{MeasureMap, Measurement, StatsRecorder, ViewManager};
use kvscope_shared::{ErrorCode, ErrorEnvelope, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Failures raised by [`InMemoryStats`].
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// A different view is already registered under the same name.
    #[error("view '{name}' is already registered with a different definition")]
    ViewConflict {
        /// Conflicting view name.
        name: String,
    },
    /// A thread panicked while holding the registry lock.
    #[error("stats registry lock poisoned")]
    LockPoisoned,
}

impl From<StatsError> for ErrorEnvelope {
    fn from(error: StatsError) -> Self {
        let message = error.to_string();
        match error {
            StatsError::ViewConflict { name } => {
                Self::expected(ErrorCode::new("stats", "view_conflict"), message)
                    .with_metadata("view", name)
            },
            StatsError::LockPoisoned => {
                Self::invariant(ErrorCode::new("stats", "lock_poisoned"), message)
            },
        }
    }
}

/// Aggregated values for one row of a distribution view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionData {
    /// Number of samples.
    pub count: u64,
    /// Sum of samples.
    pub sum: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Per-bucket counts; the last bucket is overflow.
    pub bucket_counts: Vec<u64>,
}

impl DistributionData {
    fn new(boundaries: &BucketBoundaries) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            mean: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            bucket_counts: vec![0; boundaries.bucket_count()],
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "sample counts stay far below 2^53"
    )]
    fn add(&mut self, boundaries: &BucketBoundaries, value: f64) {
        self.count += 1;
        self.sum += value;
        self.mean = self.sum / self.count as f64;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if let Some(bucket) = self.bucket_counts.get_mut(boundaries.bucket_index(value)) {
            *bucket += 1;
        }
    }
}

/// Aggregated value of one view row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AggregationData {
    /// Number of samples.
    Count {
        /// Sample count.
        count: u64,
    },
    /// Histogram and summary statistics.
    Distribution(DistributionData),
}

impl AggregationData {
    fn new(aggregation: &Aggregation) -> Self {
        match aggregation {
            Aggregation::Count => Self::Count { count: 0 },
            Aggregation::Distribution(boundaries) => {
                Self::Distribution(DistributionData::new(boundaries))
            },
        }
    }

    fn add(&mut self, aggregation: &Aggregation, value: f64) {
        match (self, aggregation) {
            (Self::Count { count }, _) => *count += 1,
            (Self::Distribution(data), Aggregation::Distribution(boundaries)) => {
                data.add(boundaries, value);
            },
            (Self::Distribution(_), Aggregation::Count) => {},
        }
    }

    /// Number of samples folded into the row.
    #[must_use]
    pub const fn count(&self) -> u64 {
        match self {
            Self::Count { count } => *count,
            Self::Distribution(data) => data.count,
        }
    }
}

/// One row of a view: the values of the view's tag columns, and the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    /// Tag values in column order; `None` when the tag was absent.
    pub tags: Vec<Option<TagValue>>,
    /// Aggregated samples.
    pub data: AggregationData,
}

/// Snapshot of a registered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewData {
    /// View definition.
    pub view: View,
    /// Rows ordered by tag values.
    pub rows: Vec<ViewRow>,
}

impl ViewData {
    /// Row whose tag columns equal `tags`.
    #[must_use]
    pub fn row(&self, tags: &[Option<&str>]) -> Option<&ViewRow> {
        self.rows.iter().find(|row| {
            row.tags.len() == tags.len()
                && row
                    .tags
                    .iter()
                    .zip(tags)
                    .all(|(actual, expected)| actual.as_ref().map(TagValue::as_str) == *expected)
        })
    }
}

struct ViewState {
    view: View,
    rows: BTreeMap<Vec<Option<TagValue>>, AggregationData>,
}

impl ViewState {
    fn new(view: View) -> Self {
        Self {
            view,
            rows: BTreeMap::new(),
        }
    }

    fn fold(&mut self, tags: &TagContext, value: f64) {
        let key: Vec<Option<TagValue>> = self
            .view
            .columns()
            .iter()
            .map(|column| tags.get(column).cloned())
            .collect();
        let aggregation = self.view.aggregation();
        self.rows
            .entry(key)
            .or_insert_with(|| AggregationData::new(aggregation))
            .add(aggregation, value);
    }

    fn snapshot(&self) -> ViewData {
        ViewData {
            view: self.view.clone(),
            rows: self
                .rows
                .iter()
                .map(|(tags, data)| ViewRow {
                    tags: tags.clone(),
                    data: data.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Default)]
struct Registry {
    views: BTreeMap<String, ViewState>,
}

impl Registry {
    fn record(&mut self, measurements: &[Measurement], tags: &TagContext) {
        for measurement in measurements {
            let value = measurement.value.as_f64();
            for state in self
                .views
                .values_mut()
                .filter(|state| state.view.measure() == &measurement.measure)
            {
                state.fold(tags, value);
            }
        }
    }
}

/// Stats backend that keeps registered views and their rows in memory.
///
/// Implements both [`ViewManager`] and [`StatsRecorder`]. Recordings against
/// measures with no registered view are dropped.
#[derive(Clone, Default)]
pub struct InMemoryStats {
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryStats {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one view.
    pub fn view_data(&self, name: &str) -> Result<Option<ViewData>> {
        let registry = self.registry.read().map_err(|_| StatsError::LockPoisoned)?;
        Ok(registry.views.get(name).map(ViewState::snapshot))
    }

    /// Snapshots of every registered view, ordered by name.
    pub fn all_view_data(&self) -> Result<Vec<ViewData>> {
        let registry = self.registry.read().map_err(|_| StatsError::LockPoisoned)?;
        Ok(registry.views.values().map(ViewState::snapshot).collect())
    }

    /// Names of registered views, ordered.
    pub fn registered_views(&self) -> Result<Vec<String>> {
        let registry = self.registry.read().map_err(|_| StatsError::LockPoisoned)?;
        Ok(registry.views.keys().cloned().collect())
    }

    fn record(&self, measurements: &[Measurement], tags: &TagContext) -> Result<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| StatsError::LockPoisoned)?;
        registry.record(measurements, tags);
        Ok(())
    }
}

impl ViewManager for InMemoryStats {
    fn register_view(&self, view: &View) -> Result<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| StatsError::LockPoisoned)?;
        if let Some(existing) = registry.views.get(view.name()) {
            if &existing.view == view {
                return Ok(());
            }
            return Err(StatsError::ViewConflict {
                name: view.name().to_owned(),
            }
            .into());
        }
        debug!(view = view.name(), "view registered in memory");
        registry
            .views
            .insert(view.name().to_owned(), ViewState::new(view.clone()));
        Ok(())
    }
}

impl StatsRecorder for InMemoryStats {
    fn new_measure_map(&self) -> Box<dyn MeasureMap> {
        Box::new(InMemoryMeasureMap {
            stats: self.clone(),
            measurements: Vec::new(),
        })
    }
}

struct InMemoryMeasureMap {
    stats: InMemoryStats,
    measurements: Vec<Measurement>,
}

impl MeasureMap for InMemoryMeasureMap {
    fn put(&mut self, measure: &Measure, value: MeasureValue) -> &mut dyn MeasureMap {
        self.measurements
            .push(Measurement::new(measure.clone(), value));
        self
    }

    fn record(self: Box<Self>, tags: &TagContext) -> Result<()> {
        if self.measurements.is_empty() {
            return Ok(());
        }
        self.stats.record(&self.measurements, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_domain::{
        CALLS_VIEW_NAME, DATA_TRANSFERRED_VIEW_NAME, LATENCY_VIEW_NAME, MEASURE_DATA_TRANSFERRED,
        MEASURE_LATENCY_MS, MeasureKind, TagKey, all_views, calls_view, latency_view,
    };

    fn unavailable(what: &str) -> ErrorEnvelope {
        ErrorEnvelope::invariant(ErrorCode::new("test", "missing"), what)
    }

    fn registered() -> Result<InMemoryStats> {
        let stats = InMemoryStats::new();
        for view in all_views() {
            stats.register_view(&view)?;
        }
        Ok(stats)
    }

    fn tags(method: &str, status: &TagValue) -> TagContext {
        [
            (TagKey::METHOD, TagValue::sanitize(method)),
            (TagKey::STATUS, status.clone()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn identical_registration_is_a_no_op() -> Result<()> {
        let stats = registered()?;
        stats.register_view(&latency_view())?;
        assert_eq!(stats.registered_views()?.len(), 3);
        Ok(())
    }

    #[test]
    fn conflicting_registration_is_rejected() -> Result<()> {
        let stats = registered()?;
        let conflicting = View::new(
            LATENCY_VIEW_NAME,
            "different",
            MEASURE_LATENCY_MS,
            Aggregation::Count,
            vec![TagKey::METHOD],
        );
        let error = stats.register_view(&conflicting).err();
        assert!(error.as_ref().is_some_and(|error| error.has_code("stats", "view_conflict")));
        assert_eq!(
            error.and_then(|error| error.metadata.get("view").cloned()).as_deref(),
            Some(LATENCY_VIEW_NAME)
        );
        Ok(())
    }

    #[test]
    fn latency_sample_feeds_distribution_and_count() -> Result<()> {
        let stats = registered()?;
        let mut map = stats.new_measure_map();
        map.put(&MEASURE_LATENCY_MS, MeasureValue::Double(1.2));
        map.record(&tags("redis.get", &TagValue::OK))?;
        let mut map = stats.new_measure_map();
        map.put(&MEASURE_LATENCY_MS, MeasureValue::Double(30.0));
        map.record(&tags("redis.get", &TagValue::OK))?;

        let calls = stats.view_data(CALLS_VIEW_NAME)?.ok_or_else(|| unavailable("calls"))?;
        let row = calls
            .row(&[Some("redis.get"), None, Some("OK")])
            .ok_or_else(|| unavailable("row"))?;
        assert_eq!(row.data, AggregationData::Count { count: 2 });

        let latency = stats.view_data(LATENCY_VIEW_NAME)?.ok_or_else(|| unavailable("latency"))?;
        let row = latency
            .row(&[Some("redis.get"), None, Some("OK")])
            .ok_or_else(|| unavailable("row"))?;
        let AggregationData::Distribution(data) = &row.data else {
            return Err(unavailable("expected a distribution"));
        };
        assert_eq!(data.count, 2);
        assert!((data.sum - 31.2).abs() < 1e-9);
        assert!((data.mean - 15.6).abs() < 1e-9);
        assert!((data.min - 1.2).abs() < 1e-9);
        assert!((data.max - 30.0).abs() < 1e-9);
        assert_eq!(data.bucket_counts.len(), 32);
        // 1.2 falls in [1, 1.5), 30 in [25, 50).
        assert_eq!(data.bucket_counts[8], 1);
        assert_eq!(data.bucket_counts[14], 1);
        assert_eq!(data.bucket_counts.iter().sum::<u64>(), 2);
        Ok(())
    }

    #[test]
    fn rows_are_split_by_outcome() -> Result<()> {
        let stats = registered()?;
        for status in [&TagValue::OK, &TagValue::ERROR, &TagValue::OK] {
            let mut map = stats.new_measure_map();
            map.put(&MEASURE_LATENCY_MS, MeasureValue::Double(0.5));
            map.record(&tags("redis.set", status))?;
        }

        let calls = stats.view_data(CALLS_VIEW_NAME)?.ok_or_else(|| unavailable("calls"))?;
        assert_eq!(calls.rows.len(), 2);
        let counts: Vec<u64> = calls.rows.iter().map(|row| row.data.count()).collect();
        assert_eq!(counts.iter().sum::<u64>(), 3);
        Ok(())
    }

    #[test]
    fn payload_bytes_land_in_overflow_and_first_buckets() -> Result<()> {
        let stats = registered()?;
        let mut map = stats.new_measure_map();
        map.put(&MEASURE_DATA_TRANSFERRED, MeasureValue::Long(4))
            .put(&MEASURE_DATA_TRANSFERRED, MeasureValue::Long(5_000_000_000));
        map.record(&tags("redis.mget", &TagValue::OK))?;

        let view = stats
            .view_data(DATA_TRANSFERRED_VIEW_NAME)?
            .ok_or_else(|| unavailable("bytes"))?;
        let row = view
            .row(&[Some("redis.mget"), None])
            .ok_or_else(|| unavailable("row"))?;
        let AggregationData::Distribution(data) = &row.data else {
            return Err(unavailable("expected a distribution"));
        };
        assert_eq!(data.count, 2);
        assert_eq!(data.bucket_counts[1], 1);
        assert_eq!(data.bucket_counts.last().copied(), Some(1));
        Ok(())
    }

    #[test]
    fn unregistered_measures_are_ignored() -> Result<()> {
        let stats = InMemoryStats::new();
        stats.register_view(&calls_view())?;
        let other = Measure::new("other/measure", "unused", "1", MeasureKind::Long);
        let mut map = stats.new_measure_map();
        map.put(&other, MeasureValue::Long(1));
        map.record(&TagContext::empty())?;

        let calls = stats.view_data(CALLS_VIEW_NAME)?.ok_or_else(|| unavailable("calls"))?;
        assert!(calls.rows.is_empty());
        assert_eq!(stats.view_data("missing")?, None);
        Ok(())
    }

    #[test]
    fn stats_errors_map_into_envelopes() {
        let envelope: ErrorEnvelope = StatsError::LockPoisoned.into();
        assert_eq!(envelope.code, ErrorCode::new("stats", "lock_poisoned"));
        assert_eq!(envelope.kind, kvscope_shared::ErrorKind::Invariant);
    }
}
