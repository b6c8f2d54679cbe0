//! Tagging boundary contract.

use kvscope_domain::{TagContext, TagKey, TagValue};

/// Incremental builder for a [`TagContext`].
pub trait TagContextBuilder: Send {
    /// Set a tag, replacing any previous value for the key.
    fn put(&mut self, key: TagKey, value: TagValue) -> &mut dyn TagContextBuilder;

    /// Finish the context.
    fn build(self: Box<Self>) -> TagContext;
}

/// Source of tag builders seeded from the current tag context.
pub trait Tagger: Send + Sync {
    /// Builder starting from the current context.
    fn current_builder(&self) -> Box<dyn TagContextBuilder>;
}
