//! Tagger seeded with process-level tags.

use kvscope_domain::{TagContext, TagKey, TagValue};
use kvscope_ports::{TagContextBuilder, Tagger};
use std::collections::BTreeMap;

/// Tagger whose builders start from a fixed set of base tags.
#[derive(Debug, Clone, Default)]
pub struct DefaultTagger {
    base: BTreeMap<TagKey, TagValue>,
}

impl DefaultTagger {
    /// Tagger with no base tags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a base tag applied to every context built.
    #[must_use]
    pub fn with_base_tag(mut self, key: TagKey, value: TagValue) -> Self {
        self.base.insert(key, value);
        self
    }
}

impl Tagger for DefaultTagger {
    fn current_builder(&self) -> Box<dyn TagContextBuilder> {
        Box::new(MapTagContextBuilder {
            tags: self.base.clone(),
        })
    }
}

struct MapTagContextBuilder {
    tags: BTreeMap<TagKey, TagValue>,
}

impl TagContextBuilder for MapTagContextBuilder {
    fn put(&mut self, key: TagKey, value: TagValue) -> &mut dyn TagContextBuilder {
        self.tags.insert(key, value);
        self
    }

    fn build(self: Box<Self>) -> TagContext {
        self.tags.into_iter().collect()
    }
}
