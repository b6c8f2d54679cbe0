//! Disabled backends used before anything is installed.

use kvscope_domain::{Measure, MeasureValue, SpanStatus, TagContext, TagKey, TagValue, View};
use kvscope_ports::{
    MeasureMap, Span, SpanScope, StatsRecorder, TagContextBuilder, Tagger, Tracer, ViewManager,
};
use kvscope_shared::Result;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct DisabledStats;

impl StatsRecorder for DisabledStats {
    fn new_measure_map(&self) -> Box<dyn MeasureMap> {
        Box::new(DisabledMeasureMap)
    }
}

struct DisabledMeasureMap;

impl MeasureMap for DisabledMeasureMap {
    fn put(&mut self, _measure: &Measure, _value: MeasureValue) -> &mut dyn MeasureMap {
        self
    }

    fn record(self: Box<Self>, _tags: &TagContext) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct DisabledTagger;

impl Tagger for DisabledTagger {
    fn current_builder(&self) -> Box<dyn TagContextBuilder> {
        Box::new(DisabledTagBuilder)
    }
}

struct DisabledTagBuilder;

impl TagContextBuilder for DisabledTagBuilder {
    fn put(&mut self, _key: TagKey, _value: TagValue) -> &mut dyn TagContextBuilder {
        self
    }

    fn build(self: Box<Self>) -> TagContext {
        TagContext::empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct DisabledTracer;

impl Tracer for DisabledTracer {
    fn start_span(&self, name: &str) -> Arc<dyn Span> {
        Arc::new(DisabledSpan {
            name: name.to_owned(),
        })
    }
}

struct DisabledSpan {
    name: String,
}

impl Span for DisabledSpan {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_status(&self, _status: SpanStatus) {}

    fn enter(&self) -> SpanScope {
        SpanScope::noop()
    }

    fn end(&self) {}
}

#[derive(Debug, Default)]
pub(crate) struct DisabledViewManager;

impl ViewManager for DisabledViewManager {
    fn register_view(&self, _view: &View) -> Result<()> {
        Ok(())
    }
}
