//! Tracer adapter backed by the `tracing` crate.
//!
//! Every span is a `kv.command` span carrying OpenTelemetry-style fields
//! (`otel.name`, `otel.status_code`, `otel.status_message`) so that any
//! `tracing` subscriber, including an OpenTelemetry bridge, can export it.

use kvscope_domain::SpanStatus;
use kvscope_ports::{Span, SpanScope, Tracer};
use std::sync::{Arc, Mutex};
use tracing::field::Empty;

/// Tracer that starts `tracing` spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

impl TracingTracer {
    /// New tracer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Tracer for TracingTracer {
    fn start_span(&self, name: &str) -> Arc<dyn Span> {
        let span = tracing::info_span!(
            "kv.command",
            otel.name = %name,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );
        Arc::new(TracingSpan {
            name: name.to_owned(),
            inner: Mutex::new(Some(span)),
        })
    }
}

/// A `tracing` span; closed when ended and no scope holds it current.
#[derive(Debug)]
pub struct TracingSpan {
    name: String,
    inner: Mutex<Option<tracing::Span>>,
}

impl TracingSpan {
    fn handle(&self) -> Option<tracing::Span> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Span for TracingSpan {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_status(&self, status: SpanStatus) {
        let Some(span) = self.handle() else {
            return;
        };
        span.record("otel.status_code", status.code.as_str());
        if let Some(description) = status.description.as_deref() {
            span.record("otel.status_message", description);
        }
    }

    fn enter(&self) -> SpanScope {
        match self.handle() {
            Some(span) => {
                let entered = span.entered();
                SpanScope::new(move || drop(entered))
            },
            None => SpanScope::noop(),
        }
    }

    fn end(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.take();
        }
    }
}
