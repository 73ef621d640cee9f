//! Fan-out of per-package fetch→install pipelines.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{info, warn};

use crate::catalog::{self, CatalogError};
use crate::config::ProvisionConfig;
use crate::device::DeviceCommands;
use crate::fetch::transport::ArtifactTransport;
use crate::fetch::ArtifactFetcher;
use crate::install::InstallExecutor;
use crate::telemetry::PipelineMetrics;

use super::limiter::ConcurrencyLimiter;
use super::report::{PipelineResult, RunReport};

/// Runs the provisioning pipeline for one device.
///
/// Each requested package flows through catalog resolution, a bounded fetch
/// stage, and a bounded install stage. Failures short-circuit only the owning
/// package's pipeline; every requested identifier ends the run with exactly
/// one terminal status, in completion order. Only a catalog parse failure
/// escalates past [`run`](Self::run).
pub struct PipelineOrchestrator {
    config: ProvisionConfig,
    transport: Arc<dyn ArtifactTransport>,
    device: Arc<dyn DeviceCommands>,
    metrics: Arc<PipelineMetrics>,
    shutdown: Arc<AtomicBool>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        config: ProvisionConfig,
        transport: Arc<dyn ArtifactTransport>,
        device: Arc<dyn DeviceCommands>,
    ) -> Self {
        Self {
            config,
            transport,
            device,
            metrics: Arc::new(PipelineMetrics::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Installs an externally owned shutdown flag.
    ///
    /// When set, the orchestrator stops admitting new packages; in-flight
    /// work finishes or fails naturally. There is no mid-run cancellation of
    /// started pipelines.
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Metrics recorded by this orchestrator's stages.
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Provisions all configured packages onto the device with `serial`.
    ///
    /// # Errors
    ///
    /// Only [`CatalogError`] escalates: without a parsable catalog no
    /// package can be resolved. Every other failure is captured in the
    /// returned report.
    pub async fn run(&self, serial: &str, raw_index: &str) -> Result<RunReport, CatalogError> {
        // Stable de-duplication: one pipeline and one result per identifier.
        let mut seen = HashSet::new();
        let requested_ids: Vec<String> = self
            .config
            .packages
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        let requested: HashSet<String> = requested_ids.iter().cloned().collect();

        let resolved = catalog::resolve(&requested, raw_index, &self.config.artifact_dir)?;
        info!(
            requested = requested_ids.len(),
            resolved = resolved.len(),
            "catalog resolved"
        );

        let fetch_limiter = Arc::new(ConcurrencyLimiter::new(
            self.config.download_concurrency,
            "download",
        ));
        let install_limiter = Arc::new(ConcurrencyLimiter::new(
            self.config.install_concurrency,
            "install",
        ));
        let fetcher = Arc::new(ArtifactFetcher::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.metrics),
        ));
        let installer = Arc::new(InstallExecutor::new(
            Arc::clone(&self.device),
            serial,
            Arc::clone(&self.metrics),
        ));

        let mut results = Vec::with_capacity(requested_ids.len());
        let mut pending = FuturesUnordered::new();

        for id in requested_ids {
            let Some(descriptor) = resolved.get(&id) else {
                warn!(package = %id, "requested package not found in catalog");
                self.metrics.catalog_miss();
                results.push(PipelineResult::catalog_miss(id));
                continue;
            };

            let descriptor = descriptor.clone();
            let fetcher = Arc::clone(&fetcher);
            let installer = Arc::clone(&installer);
            let fetch_limiter = Arc::clone(&fetch_limiter);
            let install_limiter = Arc::clone(&install_limiter);
            let mirrors = self.config.mirrors.clone();
            let shutdown = Arc::clone(&self.shutdown);

            pending.push(async move {
                let fetched = {
                    let _permit = fetch_limiter.acquire().await;
                    // Admission point: an interrupt stops new work here, after
                    // which in-flight pipelines drain on their own.
                    if shutdown.load(Ordering::SeqCst) {
                        info!(package = %id, "interrupted before fetch, skipping");
                        return PipelineResult::interrupted(id);
                    }
                    fetcher.fetch(&descriptor, &mirrors).await
                };

                let local = match fetched {
                    Ok(path) => path,
                    Err(e) => return PipelineResult::from_fetch_error(id, e),
                };

                let _permit = install_limiter.acquire().await;
                match installer.install(&id, &local).await {
                    Ok(()) => PipelineResult::installed(id),
                    Err(e) => PipelineResult::from_install_error(id, e),
                }
            });
        }

        while let Some(result) = pending.next().await {
            if result.is_success() {
                info!(package = %result.package_id, "package provisioned");
            } else {
                warn!(
                    package = %result.package_id,
                    status = %result.status,
                    diagnostic = result.diagnostic.as_deref().unwrap_or(""),
                    "package not provisioned"
                );
            }
            results.push(result);
        }

        Ok(RunReport { results })
    }
}
