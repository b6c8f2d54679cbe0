//! Per-call tracking: one span and one batch of measurements per store command.

use crate::deps::ObservabilityDeps;
use crate::global::default_deps;
use kvscope_domain::{
    MEASURE_DATA_TRANSFERRED, MEASURE_LATENCY_MS, MeasureValue, OperationState, SpanStatus,
    TagKey, TagValue,
};
use kvscope_ports::{Span, SpanScope};
use kvscope_shared::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Error description recorded when a call unwinds without returning.
pub const PANICKED_DESCRIPTION: &str = "call panicked";

/// Tracks one call from creation to [`TrackingOperation::end`].
///
/// Creation starts a span named after the method and captures a monotonic
/// start instant. `end` records latency and payload sizes tagged with the
/// outcome, then ends the span. Both happen at most once; dropping an
/// operation that was never ended finalizes it, as a failure when the thread
/// is unwinding and no error was recorded.
pub struct TrackingOperation {
    method: String,
    payload_lengths: Vec<usize>,
    started_at: Instant,
    span: Arc<dyn Span>,
    deps: ObservabilityDeps,
    recorded_error: Option<String>,
    state: OperationState,
}

impl TrackingOperation {
    /// Start tracking against the process-wide default backends.
    pub fn new<I, P>(method: impl Into<String>, payloads: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self::with_deps(method, payloads, default_deps())
    }

    /// Start tracking against explicit backends.
    pub fn with_deps<I, P>(method: impl Into<String>, payloads: I, deps: ObservabilityDeps) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let method = method.into();
        let payload_lengths = payloads
            .into_iter()
            .map(|payload| payload.as_ref().len())
            .collect();
        let started_at = Instant::now();
        let span = deps.tracer.start_span(&method);
        Self {
            method,
            payload_lengths,
            started_at,
            span,
            deps,
            recorded_error: None,
            state: OperationState::Active,
        }
    }

    /// Make the operation's span current until the returned scope drops.
    pub fn with_span(&self) -> SpanScope {
        self.deps.tracer.with_span(&self.span)
    }

    /// Remember `error` as the call's failure and mark the span failed.
    ///
    /// Does not finalize. A later call replaces the earlier description.
    pub fn record_error<E>(&mut self, error: &E)
    where
        E: fmt::Display + ?Sized,
    {
        let description = error.to_string();
        self.span.set_status(SpanStatus::unknown(description.clone()));
        self.recorded_error = Some(description);
    }

    /// Record measurements and end the span. Only the first call does anything.
    ///
    /// The span is ended even when recording fails or panics; a recording
    /// failure is returned afterwards.
    pub fn end(&mut self) -> Result<()> {
        if self.state.is_ended() {
            return Ok(());
        }
        self.state = OperationState::Ended;
        let _span_end = EndSpanOnDrop(Arc::clone(&self.span));
        self.record_measurements()
    }

    fn record_measurements(&self) -> Result<()> {
        let mut builder = self.deps.tagger.current_builder();
        builder.put(TagKey::METHOD, TagValue::sanitize(&self.method));
        match &self.recorded_error {
            Some(description) => {
                builder
                    .put(TagKey::ERROR, TagValue::sanitize(description))
                    .put(TagKey::STATUS, TagValue::ERROR);
            },
            None => {
                builder.put(TagKey::STATUS, TagValue::OK);
            },
        }
        let tags = builder.build();

        let latency_ms = self.started_at.elapsed().as_secs_f64() * 1000.0;
        let mut measurements = self.deps.stats.new_measure_map();
        measurements.put(&MEASURE_LATENCY_MS, MeasureValue::Double(latency_ms));
        for length in &self.payload_lengths {
            let bytes = i64::try_from(*length).unwrap_or(i64::MAX);
            measurements.put(&MEASURE_DATA_TRANSFERRED, MeasureValue::Long(bytes));
        }
        measurements.record(&tags)
    }

    /// Method identifier, also the span name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Byte length of each payload string.
    pub fn payload_lengths(&self) -> &[usize] {
        &self.payload_lengths
    }

    /// Description of the recorded failure, if any.
    pub fn recorded_error(&self) -> Option<&str> {
        self.recorded_error.as_deref()
    }

    /// Lifecycle state.
    pub const fn state(&self) -> OperationState {
        self.state
    }
}

impl fmt::Debug for TrackingOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TrackingOperation")
            .field("method", &self.method)
            .field("payload_lengths", &self.payload_lengths)
            .field("recorded_error", &self.recorded_error)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Drop for TrackingOperation {
    fn drop(&mut self) {
        if self.state.is_ended() {
            return;
        }
        if std::thread::panicking() && self.recorded_error.is_none() {
            self.record_error(PANICKED_DESCRIPTION);
        }
        if let Err(error) = self.end() {
            warn!(
                method = %self.method,
                error = %error,
                "recording a dropped tracking operation failed"
            );
        }
    }
}

struct EndSpanOnDrop(Arc<dyn Span>);

impl Drop for EndSpanOnDrop {
    fn drop(&mut self) {
        self.0.end();
    }
}
