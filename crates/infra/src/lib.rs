//! # kvscope-infra
//!
//! Logging setup and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// `tracing` subscriber initialization.
pub mod logging;
/// Composition root.
pub mod runtime;

pub use logging::{env_filter, init_logging};
pub use runtime::{Runtime, bootstrap};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_adapters::adapters_crate_version;
    use kvscope_app::app_crate_version;
    use kvscope_config::config_crate_version;
    use kvscope_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if in_deps && line.starts_with("kvscope-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn infra_depends_on_app_adapters_config() {
        let deps = workspace_deps();
        let required = ["kvscope-app", "kvscope-adapters", "kvscope-config"];

        for expected in required {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn infra_crate_compiles() {
        let version = infra_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn infra_can_use_app_adapters_config_shared() {
        assert!(!app_crate_version().is_empty());
        assert!(!adapters_crate_version().is_empty());
        assert!(!config_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
