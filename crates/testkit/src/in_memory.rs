//! Recording implementations of the capability ports.
//!
//! Every double keeps what it was asked to do behind a `Mutex` so tests can
//! assert on puts, tags, span statuses, and registrations afterwards.

use kvscope_domain::{
    MEASURE_DATA_TRANSFERRED, MEASURE_LATENCY_MS, Measure, MeasureValue, SpanStatus, TagContext,
    TagKey, TagValue, View,
};
use kvscope_ports::{
    MeasureMap, Measurement, Span, SpanScope, StatsRecorder, TagContextBuilder, Tagger, Tracer,
    ViewManager,
};
use kvscope_shared::{ErrorEnvelope, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// STATS
// =============================================================================

/// One `record` call: the measurements put so far and the tags used.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    /// Measurements in put order.
    pub measurements: Vec<Measurement>,
    /// Tags passed to `record`.
    pub tags: TagContext,
}

impl RecordedBatch {
    /// Values put for `measure`, in put order.
    pub fn values_for(&self, measure: &Measure) -> Vec<MeasureValue> {
        self.measurements
            .iter()
            .filter(|measurement| &measurement.measure == measure)
            .map(|measurement| measurement.value)
            .collect()
    }
}

/// Stats recorder that keeps every recorded batch.
///
/// A recorder built with [`RecordingStats::failing`] still keeps the batch,
/// then returns the configured error from `record`.
#[derive(Debug, Default)]
pub struct RecordingStats {
    batches: Arc<Mutex<Vec<RecordedBatch>>>,
    failure: Option<ErrorEnvelope>,
    maps_created: AtomicUsize,
}

impl RecordingStats {
    /// Recorder that accepts every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose `record` fails with `error`.
    pub fn failing(error: ErrorEnvelope) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// All recorded batches.
    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.batches.lock().expect("stats lock").clone()
    }

    /// Number of measure maps handed out.
    pub fn maps_created(&self) -> usize {
        self.maps_created.load(Ordering::SeqCst)
    }

    /// Latency values across all batches.
    pub fn latency_samples(&self) -> Vec<f64> {
        self.samples_for(&MEASURE_LATENCY_MS)
    }

    /// Data-transferred values across all batches.
    pub fn byte_samples(&self) -> Vec<f64> {
        self.samples_for(&MEASURE_DATA_TRANSFERRED)
    }

    fn samples_for(&self, measure: &Measure) -> Vec<f64> {
        self.batches()
            .iter()
            .flat_map(|batch| batch.values_for(measure))
            .map(MeasureValue::as_f64)
            .collect()
    }
}

impl StatsRecorder for RecordingStats {
    fn new_measure_map(&self) -> Box<dyn MeasureMap> {
        self.maps_created.fetch_add(1, Ordering::SeqCst);
        Box::new(RecordingMeasureMap {
            batches: Arc::clone(&self.batches),
            failure: self.failure.clone(),
            measurements: Vec::new(),
        })
    }
}

struct RecordingMeasureMap {
    batches: Arc<Mutex<Vec<RecordedBatch>>>,
    failure: Option<ErrorEnvelope>,
    measurements: Vec<Measurement>,
}

impl MeasureMap for RecordingMeasureMap {
    fn put(&mut self, measure: &Measure, value: MeasureValue) -> &mut dyn MeasureMap {
        self.measurements
            .push(Measurement::new(measure.clone(), value));
        self
    }

    fn record(self: Box<Self>, tags: &TagContext) -> Result<()> {
        self.batches.lock().expect("stats lock").push(RecordedBatch {
            measurements: self.measurements,
            tags: tags.clone(),
        });
        match self.failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// =============================================================================
// TAGS
// =============================================================================

/// Tagger whose builders start from a fixed base context.
#[derive(Debug, Default)]
pub struct RecordingTagger {
    base: BTreeMap<TagKey, TagValue>,
    builders: AtomicUsize,
}

impl RecordingTagger {
    /// Tagger with an empty base context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tagger whose builders start with `tags`.
    pub fn with_base(tags: impl IntoIterator<Item = (TagKey, TagValue)>) -> Self {
        Self {
            base: tags.into_iter().collect(),
            builders: AtomicUsize::new(0),
        }
    }

    /// Number of builders handed out.
    pub fn builders_created(&self) -> usize {
        self.builders.load(Ordering::SeqCst)
    }
}

impl Tagger for RecordingTagger {
    fn current_builder(&self) -> Box<dyn TagContextBuilder> {
        self.builders.fetch_add(1, Ordering::SeqCst);
        Box::new(MapTagBuilder {
            tags: self.base.clone(),
        })
    }
}

struct MapTagBuilder {
    tags: BTreeMap<TagKey, TagValue>,
}

impl TagContextBuilder for MapTagBuilder {
    fn put(&mut self, key: TagKey, value: TagValue) -> &mut dyn TagContextBuilder {
        self.tags.insert(key, value);
        self
    }

    fn build(self: Box<Self>) -> TagContext {
        self.tags.into_iter().collect()
    }
}

// =============================================================================
// TRACING
// =============================================================================

/// Span that remembers statuses, entries, and ends.
#[derive(Debug)]
pub struct RecordingSpan {
    name: String,
    statuses: Mutex<Vec<SpanStatus>>,
    ends: AtomicUsize,
    entries: AtomicUsize,
    active_scopes: Arc<AtomicUsize>,
}

impl RecordingSpan {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            statuses: Mutex::new(Vec::new()),
            ends: AtomicUsize::new(0),
            entries: AtomicUsize::new(0),
            active_scopes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every status set, in order.
    pub fn statuses(&self) -> Vec<SpanStatus> {
        self.statuses.lock().expect("span lock").clone()
    }

    /// Most recent status, if any.
    pub fn last_status(&self) -> Option<SpanStatus> {
        self.statuses().last().cloned()
    }

    /// Number of `end` calls.
    pub fn end_count(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    /// Number of times the span was made current.
    pub fn entry_count(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    /// Scopes currently holding the span current.
    pub fn active_scopes(&self) -> usize {
        self.active_scopes.load(Ordering::SeqCst)
    }
}

impl Span for RecordingSpan {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_status(&self, status: SpanStatus) {
        self.statuses.lock().expect("span lock").push(status);
    }

    fn enter(&self) -> SpanScope {
        self.entries.fetch_add(1, Ordering::SeqCst);
        self.active_scopes.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active_scopes);
        SpanScope::new(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }

    fn end(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tracer that keeps every span it starts.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    spans: Mutex<Vec<Arc<RecordingSpan>>>,
}

impl RecordingTracer {
    /// Empty tracer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans in start order.
    pub fn spans(&self) -> Vec<Arc<RecordingSpan>> {
        self.spans.lock().expect("tracer lock").clone()
    }

    /// The only span started, panicking if there is not exactly one.
    pub fn single_span(&self) -> Arc<RecordingSpan> {
        let spans = self.spans();
        assert_eq!(spans.len(), 1, "expected exactly one span");
        Arc::clone(&spans[0])
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &str) -> Arc<dyn Span> {
        let span = Arc::new(RecordingSpan::new(name));
        self.spans
            .lock()
            .expect("tracer lock")
            .push(Arc::clone(&span));
        span
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// View manager that keeps registrations and can reject a named view.
#[derive(Debug, Default)]
pub struct RecordingViewManager {
    registered: Mutex<Vec<View>>,
    reject: Option<(String, ErrorEnvelope)>,
}

impl RecordingViewManager {
    /// Manager that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager that fails with `error` when `view_name` is registered.
    pub fn rejecting(view_name: impl Into<String>, error: ErrorEnvelope) -> Self {
        Self {
            registered: Mutex::new(Vec::new()),
            reject: Some((view_name.into(), error)),
        }
    }

    /// Views accepted, in registration order.
    pub fn registered(&self) -> Vec<View> {
        self.registered.lock().expect("views lock").clone()
    }

    /// Names of the views accepted, in registration order.
    pub fn registered_names(&self) -> Vec<String> {
        self.registered()
            .iter()
            .map(|view| view.name().to_owned())
            .collect()
    }
}

impl ViewManager for RecordingViewManager {
    fn register_view(&self, view: &View) -> Result<()> {
        if let Some((name, error)) = &self.reject {
            if name == view.name() {
                return Err(error.clone());
            }
        }
        self.registered
            .lock()
            .expect("views lock")
            .push(view.clone());
        Ok(())
    }
}

// =============================================================================
// BUNDLE
// =============================================================================

/// Recording stats, tagger, and tracer created together.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackends {
    /// Stats double.
    pub stats: Arc<RecordingStats>,
    /// Tagger double.
    pub tagger: Arc<RecordingTagger>,
    /// Tracer double.
    pub tracer: Arc<RecordingTracer>,
}

impl RecordingBackends {
    /// Fresh doubles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh doubles whose stats recorder fails with `error`.
    pub fn with_failing_stats(error: ErrorEnvelope) -> Self {
        Self {
            stats: Arc::new(RecordingStats::failing(error)),
            ..Self::default()
        }
    }
}
