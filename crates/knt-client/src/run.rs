//! End-to-end test run
//!
//! Creates the manifest resources, waits for the agents, runs both checks
//! concurrently and tears the resources down again. Once any resource was
//! created, teardown runs no matter how the rest of the run ends.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use knt_core::config::ClientConfig;
use knt_core::traits::{ClusterClient, ReadinessWatcher};
use knt_core::{ClusterError, Resource};
use knt_model::direct::work_size;
use knt_model::{DirectCheckResultItem, ServiceCheckResponse};

use crate::checker::{Checker, CheckerError};
use crate::manifest::Manifest;
use crate::plan::CheckPlan;

/// Outcome of both checks
#[derive(Debug)]
pub struct RunReport {
    /// Requests that were sent
    pub plan: CheckPlan,
    /// Service check result
    pub service: Result<ServiceCheckResponse, CheckerError>,
    /// Direct check result: the failed probes
    pub direct: Result<Vec<DirectCheckResultItem>, CheckerError>,
}

impl RunReport {
    /// Both checks completed and no probe failed
    pub fn passed(&self) -> bool {
        let service_clean = matches!(&self.service, Ok(response) if response.is_clean());
        let direct_clean = matches!(&self.direct, Ok(failures) if failures.is_empty());
        service_clean && direct_clean
    }

    /// Number of probes in the direct check
    pub fn direct_probes(&self) -> usize {
        work_size(&self.plan.direct)
    }
}

/// One test run against a cluster
pub struct TestRun<'a> {
    cluster: &'a dyn ClusterClient,
    watcher: &'a dyn ReadinessWatcher,
    checker: &'a Checker,
    replicas: u32,
    service_probes: usize,
    readiness_timeout: Option<Duration>,
}

impl<'a> TestRun<'a> {
    /// Create a run from its collaborators and the client configuration
    pub fn new(
        cluster: &'a dyn ClusterClient,
        watcher: &'a dyn ReadinessWatcher,
        checker: &'a Checker,
        config: &ClientConfig,
    ) -> Self {
        Self {
            cluster,
            watcher,
            checker,
            replicas: config.replicas,
            service_probes: config.service_probe_count(),
            readiness_timeout: config.readiness_timeout,
        }
    }

    /// Execute the run. Cancelling `cancel` stops waiting or checking and
    /// proceeds straight to teardown.
    pub async fn execute(&self, manifest: &Manifest, cancel: &CancellationToken) -> Result<RunReport> {
        let created = self.create_all(manifest).await?;

        let outcome = tokio::select! {
            outcome = self.check(manifest) => outcome,
            _ = cancel.cancelled() => Err(anyhow::anyhow!("Interrupted before the checks completed")),
        };

        self.teardown(&created).await;
        outcome
    }

    /// Create every resource in order. On failure the resources created so
    /// far are deleted before the error is returned.
    async fn create_all<'m>(&self, manifest: &'m Manifest) -> Result<Vec<&'m Resource>> {
        let mut created = Vec::new();
        for resource in manifest.resources() {
            if let Err(e) = self.cluster.create(resource).await {
                self.teardown(&created).await;
                return Err(e)
                    .with_context(|| format!("Failed to create {} {}", resource.kind, resource.name));
            }
            created.push(resource);
        }
        Ok(created)
    }

    async fn check(&self, manifest: &Manifest) -> Result<RunReport> {
        let deployment = &manifest.deployment().name;
        tracing::info!(
            "Waiting for {} replicas of deployment {}",
            self.replicas,
            deployment
        );

        let wait = self.watcher.wait_available(deployment, self.replicas);
        let ready = match self.readiness_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .unwrap_or_else(|_| Err(ClusterError::ReadinessTimeout(deployment.clone()))),
            None => wait.await,
        };
        ready.context("Agents did not become available")?;

        let selector = manifest.pod_selector();
        let pods = self
            .cluster
            .list_pods(selector)
            .await
            .context("Failed to list agent pods")?;
        if pods.is_empty() {
            anyhow::bail!("No agent pods match selector {}", selector);
        }

        let plan = CheckPlan::new(manifest, pods, self.service_probes);
        tracing::info!(
            "Running checks: {} service probes to {}, {} direct probes across {} pods",
            plan.service.count,
            plan.service.target_url,
            work_size(&plan.direct),
            plan.direct.len()
        );

        let started = Instant::now();
        let (service, direct) = tokio::join!(
            self.checker.service(&plan.service),
            self.checker.direct(&plan.direct)
        );
        tracing::info!("Checks finished in {:?}", started.elapsed());

        Ok(RunReport {
            plan,
            service,
            direct,
        })
    }

    /// Delete resources in reverse creation order, logging failures
    async fn teardown(&self, created: &[&Resource]) {
        for resource in created.iter().rev() {
            if let Err(e) = self.cluster.delete(resource.kind, &resource.name).await {
                tracing::error!("Failed to delete {} {}: {}", resource.kind, resource.name, e);
            }
        }
    }
}
