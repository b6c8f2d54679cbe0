//! Process-wide default backends.
//!
//! Installed once at startup. Until then, and when nothing is ever installed,
//! the disabled backends are returned.

use crate::deps::ObservabilityDeps;
use crate::noop::DisabledViewManager;
use kvscope_ports::ViewManager;
use kvscope_shared::{ErrorCode, ErrorEnvelope, Result};
use std::sync::{Arc, OnceLock};
use tracing::debug;

struct Defaults {
    deps: ObservabilityDeps,
    views: Arc<dyn ViewManager>,
}

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

/// Install the process-wide backends. Fails if already installed.
pub fn install_defaults(deps: ObservabilityDeps, views: Arc<dyn ViewManager>) -> Result<()> {
    DEFAULTS.set(Defaults { deps, views }).map_err(|_| {
        ErrorEnvelope::expected(
            ErrorCode::new("app", "defaults_already_installed"),
            "observability backends are already installed for this process",
        )
    })?;
    debug!("installed default observability backends");
    Ok(())
}

/// Returns true once [`install_defaults`] succeeded.
pub fn defaults_installed() -> bool {
    DEFAULTS.get().is_some()
}

/// Installed backends, or disabled ones.
pub fn default_deps() -> ObservabilityDeps {
    DEFAULTS
        .get()
        .map_or_else(ObservabilityDeps::disabled, |defaults| defaults.deps.clone())
}

/// Installed view manager, or one that accepts and discards registrations.
pub fn default_view_manager() -> Arc<dyn ViewManager> {
    DEFAULTS.get().map_or_else(
        || Arc::new(DisabledViewManager) as Arc<dyn ViewManager>,
        |defaults| Arc::clone(&defaults.views),
    )
}
