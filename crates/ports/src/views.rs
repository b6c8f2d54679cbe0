//! View registration boundary contract.

use kvscope_domain::View;
use kvscope_shared::Result;

/// Backend that accepts view definitions.
///
/// Re-registration policy belongs to the implementation.
pub trait ViewManager: Send + Sync {
    /// Register a view.
    fn register_view(&self, view: &View) -> Result<()>;
}
