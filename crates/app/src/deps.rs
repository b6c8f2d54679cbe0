//! Backends a tracking operation records into.

use crate::noop::{DisabledStats, DisabledTagger, DisabledTracer};
use kvscope_ports::{StatsRecorder, Tagger, Tracer};
use std::fmt;
use std::sync::Arc;

/// Stats recorder, tagger, and tracer used by tracking operations.
#[derive(Clone)]
pub struct ObservabilityDeps {
    /// Stats backend.
    pub stats: Arc<dyn StatsRecorder>,
    /// Tag context source.
    pub tagger: Arc<dyn Tagger>,
    /// Tracing backend.
    pub tracer: Arc<dyn Tracer>,
}

impl ObservabilityDeps {
    /// Bundle the three backends.
    pub fn new(
        stats: Arc<dyn StatsRecorder>,
        tagger: Arc<dyn Tagger>,
        tracer: Arc<dyn Tracer>,
    ) -> Self {
        Self {
            stats,
            tagger,
            tracer,
        }
    }

    /// Backends that accept everything and keep nothing.
    pub fn disabled() -> Self {
        Self::new(
            Arc::new(DisabledStats),
            Arc::new(DisabledTagger),
            Arc::new(DisabledTracer),
        )
    }
}

impl fmt::Debug for ObservabilityDeps {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ObservabilityDeps")
            .finish_non_exhaustive()
    }
}
