//! Composition root: builds the adapters from config and installs them.

use crate::logging::init_logging;
use kvscope_adapters::{
    DefaultTagger, InMemoryStats, JsonViewExporter, LogSink, StderrLogSink, TracedConnection,
    TracingTracer,
};
use kvscope_app::{ObservabilityDeps, install_defaults, register_all_views};
use kvscope_config::{ExportTarget, ValidatedObservabilityConfig};
use kvscope_shared::Result;
use redis::ConnectionLike;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Wired backends for one process.
#[derive(Clone)]
pub struct Runtime {
    config: ValidatedObservabilityConfig,
    stats: InMemoryStats,
    deps: ObservabilityDeps,
    exporter: JsonViewExporter,
}

impl Runtime {
    /// Build the backends without touching process-wide state.
    ///
    /// Views are registered when the config asks for it. Exported snapshots
    /// go to `sink`.
    pub fn build(config: ValidatedObservabilityConfig, sink: Arc<dyn LogSink>) -> Result<Self> {
        let stats = InMemoryStats::new();
        if config.views.register_on_startup {
            register_all_views(&stats)?;
        }
        let deps = ObservabilityDeps::new(
            Arc::new(stats.clone()),
            Arc::new(DefaultTagger::new()),
            Arc::new(TracingTracer::new()),
        );
        Ok(Self {
            config,
            stats,
            deps,
            exporter: JsonViewExporter::new(sink),
        })
    }

    /// Make these backends the process-wide defaults.
    pub fn install(&self) -> Result<()> {
        install_defaults(self.deps.clone(), Arc::new(self.stats.clone()))
    }

    /// Wrap a connection so every command through it is tracked.
    pub fn wrap<C: ConnectionLike>(&self, connection: C) -> TracedConnection<C> {
        TracedConnection::new(
            connection,
            self.deps.clone(),
            self.config.method_prefix.clone(),
        )
    }

    /// Write a snapshot of every view. Returns the number of rows written,
    /// zero when export is disabled.
    pub fn export(&self) -> Result<usize> {
        if !self.config.export.enabled {
            return Ok(0);
        }
        let views = self.stats.all_view_data()?;
        let written = self.exporter.export(&views);
        debug!(rows = written, "exported view snapshot");
        Ok(written)
    }

    /// Effective configuration.
    pub const fn config(&self) -> &ValidatedObservabilityConfig {
        &self.config
    }

    /// In-process stats backend.
    pub const fn stats(&self) -> &InMemoryStats {
        &self.stats
    }

    /// Backends handed to tracked operations.
    pub const fn deps(&self) -> &ObservabilityDeps {
        &self.deps
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Runtime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Initialize logging, build the backends, and install them as defaults.
///
/// Fails if defaults were already installed in this process.
pub fn bootstrap(config: &ValidatedObservabilityConfig) -> Result<Runtime> {
    let logging_installed = init_logging(&config.logging);
    let sink: Arc<dyn LogSink> = match config.export.target {
        ExportTarget::Stderr => Arc::new(StderrLogSink),
    };
    let runtime = Runtime::build(config.clone(), sink)?;
    runtime.install()?;
    info!(
        method_prefix = %config.method_prefix,
        views_registered = config.views.register_on_startup,
        export_enabled = config.export.enabled,
        logging_installed,
        "kvscope observability bootstrapped"
    );
    Ok(runtime)
}
