//! Tracing boundary contract.

use kvscope_domain::SpanStatus;
use std::fmt;
use std::sync::Arc;

/// Guard that keeps a span current until dropped.
///
/// Current-span state is per thread, so the guard is not `Send`.
#[must_use = "the span is only current while the scope is alive"]
pub struct SpanScope {
    on_exit: Option<Box<dyn FnOnce()>>,
}

impl SpanScope {
    /// Scope that runs `on_exit` when dropped.
    pub fn new(on_exit: impl FnOnce() + 'static) -> Self {
        Self {
            on_exit: Some(Box::new(on_exit)),
        }
    }

    /// Scope with nothing to restore.
    pub const fn noop() -> Self {
        Self { on_exit: None }
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        if let Some(on_exit) = self.on_exit.take() {
            on_exit();
        }
    }
}

impl fmt::Debug for SpanScope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SpanScope")
            .field("active", &self.on_exit.is_some())
            .finish()
    }
}

/// A started span.
pub trait Span: Send + Sync {
    /// Span name.
    fn name(&self) -> &str;

    /// Set the span status. Later calls replace earlier ones.
    fn set_status(&self, status: SpanStatus);

    /// Make the span current on this thread until the scope drops.
    fn enter(&self) -> SpanScope;

    /// End the span.
    fn end(&self);
}

/// Boundary contract for a tracing backend.
pub trait Tracer: Send + Sync {
    /// Start a span named `name`.
    fn start_span(&self, name: &str) -> Arc<dyn Span>;

    /// Make `span` current until the returned scope drops.
    fn with_span(&self, span: &Arc<dyn Span>) -> SpanScope {
        span.enter()
    }
}
