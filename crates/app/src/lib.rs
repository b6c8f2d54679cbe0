//! # kvscope-app
//!
//! Instrumentation use cases: per-call tracking, the generic `instrument`
//! helper every command wrapper goes through, and view registration.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod deps;
pub mod global;
pub mod instrument;
mod noop;
pub mod registry;
pub mod tracking;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use deps::ObservabilityDeps;
pub use global::{default_deps, default_view_manager, defaults_installed, install_defaults};
pub use instrument::{instrument, instrument_with};
pub use registry::{register_all_views, register_all_views_default};
pub use tracking::{PANICKED_DESCRIPTION, TrackingOperation};

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_domain::domain_crate_version;
    use kvscope_ports::ports_crate_version;
    use kvscope_shared::shared_crate_version;

    #[test]
    fn app_crate_compiles() {
        let version = app_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn app_can_use_ports_domain_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
