//! One-time registration of the instrumentation views.

use crate::global::default_view_manager;
use kvscope_domain::all_views;
use kvscope_ports::ViewManager;
use kvscope_shared::{Result, ResultExt};
use tracing::debug;

/// Register the latency, calls, and data-transferred views, in that order.
///
/// The first failure stops registration and is returned with the view name
/// attached as `view` metadata.
pub fn register_all_views(manager: &dyn ViewManager) -> Result<()> {
    for view in all_views() {
        manager
            .register_view(&view)
            .with_metadata("view", view.name())?;
        debug!(view = view.name(), measure = view.measure().name(), "registered view");
    }
    Ok(())
}

/// Register the views against the process-wide view manager.
pub fn register_all_views_default() -> Result<()> {
    register_all_views(default_view_manager().as_ref())
}
