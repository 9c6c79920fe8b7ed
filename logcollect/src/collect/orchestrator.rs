//! Collection orchestrator
//!
//! Drives one run from discovery to archive:
//!
//! 1. list namespaces and validate the federation (nothing staged yet)
//! 2. discover pods, pod inventory and deployments
//! 3. resolve the selection into a [`CollectionPlan`]
//! 4. stage the inventory, container logs and manifests
//! 5. fetch debug API bundles (enumerate, copy, delete)
//! 6. archive the working directory exactly once
//!
//! Every error after step 1 purges the working directory before it is
//! returned. There are no retries.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::app::abort::AbortHandle;
use crate::cluster::ClusterClient;
use crate::collect::collector::ArtifactCollector;
use crate::collect::fsm::RunEvent;
use crate::collect::selection::{
    self, CollectionPlan, DebugCliPlan, DebugLogPlan, Discovery, Selection,
};
use crate::collect::state::{CommonConfigTracker, RunState};
use crate::console;
use crate::debugapi::{DebugApiClient, DebugTarget, LogCollectMode};
use crate::errors::CollectError;
use crate::staging::{Archiver, StagingArea};
use crate::storage::settings::Settings;

/// Orchestrator options
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// The only federation collection runs against
    pub supported_federation: String,

    /// Known workload kinds (pod-name prefixes)
    pub workload_kinds: Vec<String>,

    /// Parent of the working directory
    pub staging_root: PathBuf,

    /// Directory inside workload containers holding debug API bundles
    pub remote_log_dir: String,

    /// Where the archive is written
    pub output_dir: PathBuf,
}

impl From<&Settings> for OrchestratorOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            supported_federation: settings.supported_federation.clone(),
            workload_kinds: settings.workload_kinds.clone(),
            staging_root: settings.staging_root.clone(),
            remote_log_dir: settings.remote_log_dir.clone(),
            output_dir: settings.output_dir.clone(),
        }
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub archive: PathBuf,
    /// Debug API bundles copied
    pub bundles: usize,
    /// Container log dumps
    pub container_logs: usize,
    /// Deployment manifest dumps
    pub manifests: usize,
}

/// Collection orchestrator
pub struct Orchestrator {
    cluster: Arc<dyn ClusterClient>,
    debug_api: DebugApiClient,
    collector: ArtifactCollector,
    options: OrchestratorOptions,
    abort: AbortHandle,
}

impl Orchestrator {
    /// Create an orchestrator. The working directory path is published to
    /// `abort` as soon as the federation is known.
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        options: OrchestratorOptions,
        abort: AbortHandle,
    ) -> Self {
        Self {
            debug_api: DebugApiClient::new(cluster.clone()),
            collector: ArtifactCollector::new(cluster.clone()),
            cluster,
            options,
            abort,
        }
    }

    /// Run discovery, selection, collection and archiving. `state` must be in
    /// the locked phase.
    pub async fn run(
        &self,
        selection: &Selection,
        state: &mut RunState,
    ) -> Result<CollectionReport, CollectError> {
        state.advance(RunEvent::Discover)?;

        let namespaces = self.cluster.list_namespaces().await?;
        let federation = selection::validate_federation(
            selection,
            &namespaces,
            &self.options.supported_federation,
        )?;
        console::notice(format!(
            "Fed '{}' exists in the cluster. Entering execution...",
            federation
        ));

        let staging = StagingArea::new(&self.options.staging_root, &federation);
        self.abort.publish(staging.path());

        match self.run_staged(selection, &federation, &staging, state).await {
            Ok(report) => Ok(report),
            Err(e) => {
                if staging.exists().await {
                    if let Err(purge_err) = staging.purge().await {
                        tracing::error!("Failed to purge working directory: {}", purge_err);
                    }
                }
                Err(e)
            }
        }
    }

    async fn run_staged(
        &self,
        selection: &Selection,
        federation: &str,
        staging: &StagingArea,
        state: &mut RunState,
    ) -> Result<CollectionReport, CollectError> {
        let discovery = self.discover(federation).await?;

        state.advance(RunEvent::Select)?;
        let plan = selection::resolve(
            selection,
            federation,
            &discovery,
            &self.options.workload_kinds,
        )?;
        debug!("Collection plan: {:?}", plan);

        state.advance(RunEvent::Collect)?;
        let mut report = CollectionReport::default();
        staging.ensure_dir().await?;
        self.collector
            .store_pod_inventory(staging, federation, &discovery.inventory)
            .await?;

        self.collect(&plan, &discovery, staging, &mut state.common, &mut report)
            .await?;

        state.advance(RunEvent::Archive)?;
        let archive = Archiver::new(&self.options.output_dir)
            .archive(staging, federation)
            .await?;
        console::success("Archived log files successfully.");

        report.archive = archive;
        info!(
            "Collected {} bundles, {} container logs, {} manifests into {}",
            report.bundles,
            report.container_logs,
            report.manifests,
            report.archive.display()
        );
        Ok(report)
    }

    async fn discover(&self, federation: &str) -> Result<Discovery, CollectError> {
        let pods = self.cluster.list_pods(federation).await?;
        let inventory = self.cluster.list_pod_inventory(federation).await?;
        let deployments = self.cluster.list_deployments(federation).await?;
        debug!(
            "Discovered {} pods and {} deployments in {}",
            pods.len(),
            deployments.len(),
            federation
        );
        Ok(Discovery {
            pods,
            deployments,
            inventory,
        })
    }

    async fn collect(
        &self,
        plan: &CollectionPlan,
        discovery: &Discovery,
        staging: &StagingArea,
        common: &mut CommonConfigTracker,
        report: &mut CollectionReport,
    ) -> Result<(), CollectError> {
        if let Some(debug_logs) = &plan.debug_logs {
            self.collect_debug_logs(debug_logs, &plan.federation, &discovery.pods, staging, report)
                .await?;
        }

        if let Some(debug_cli) = &plan.debug_cli {
            self.collect_bundles(
                debug_cli,
                &plan.federation,
                &discovery.pods,
                staging,
                common,
                report,
            )
            .await?;
        }

        Ok(())
    }

    async fn collect_debug_logs(
        &self,
        plan: &DebugLogPlan,
        federation: &str,
        pods: &[String],
        staging: &StagingArea,
        report: &mut CollectionReport,
    ) -> Result<(), CollectError> {
        for deployment in &plan.deployments {
            let workers = self
                .cluster
                .list_worker_containers(federation, deployment)
                .await?;

            if workers.is_empty() {
                console::notice(format!(
                    "No worker containers available for {}, skipping debug logs...",
                    deployment
                ));
            } else {
                let containers: Vec<&str> = match &plan.container {
                    Some(container) if workers.contains(container) => {
                        console::notice(format!(
                            "Storing debug logs for {} container of {}...",
                            container, deployment
                        ));
                        vec![container.as_str()]
                    }
                    Some(container) => {
                        return Err(CollectError::invalid_selection(format!(
                            "Containers present in {}: {:?}. {} doesn't exist in {}.",
                            deployment, workers, container, deployment
                        )));
                    }
                    None => {
                        console::notice(format!(
                            "Storing debug logs for all containers of {}...",
                            deployment
                        ));
                        workers.iter().map(String::as_str).collect()
                    }
                };

                for instance in pods.iter().filter(|pod| pod.starts_with(deployment.as_str())) {
                    for container in &containers {
                        self.collector
                            .store_debug_logs(staging, federation, instance, container)
                            .await?;
                        report.container_logs += 1;
                    }
                }
            }

            console::notice(format!("Storing deployment file for {}...", deployment));
            self.collector
                .store_deployment(staging, federation, deployment)
                .await?;
            report.manifests += 1;
        }

        Ok(())
    }

    async fn collect_bundles(
        &self,
        plan: &DebugCliPlan,
        federation: &str,
        pods: &[String],
        staging: &StagingArea,
        common: &mut CommonConfigTracker,
        report: &mut CollectionReport,
    ) -> Result<(), CollectError> {
        let mode = LogCollectMode::per_instance(plan.verbose);

        for kind in &plan.kinds {
            console::notice(format!("Storing logs for {}...", kind));

            for instance in pods.iter().filter(|pod| pod.starts_with(kind.as_str())) {
                if !common.is_fetched(kind) {
                    self.fetch_bundle(staging, federation, instance, kind, LogCollectMode::Common)
                        .await?;
                    common.mark_fetched(kind);
                    report.bundles += 1;
                }

                self.fetch_bundle(staging, federation, instance, kind, mode)
                    .await?;
                report.bundles += 1;
            }
        }

        Ok(())
    }

    /// Enumerate a bundle, copy it into the working directory, then delete
    /// it remotely. The delete is only issued after the copy succeeded.
    async fn fetch_bundle(
        &self,
        staging: &StagingArea,
        federation: &str,
        instance: &str,
        kind: &str,
        mode: LogCollectMode,
    ) -> Result<String, CollectError> {
        let port = self.cluster.get_exposed_port(federation, kind).await?;
        let target = DebugTarget {
            federation,
            instance,
            container: kind,
            port,
        };

        let file_name = self.debug_api.enumerate(target, mode).await?;
        let remote_path = format!(
            "{}/{}",
            self.options.remote_log_dir.trim_end_matches('/'),
            file_name
        );

        staging.ensure_dir().await?;
        self.cluster
            .copy_file_from_container(
                federation,
                instance,
                kind,
                &remote_path,
                &staging.file_path(&file_name),
            )
            .await?;

        self.debug_api.delete(target, &file_name).await?;
        debug!("Fetched {} bundle {} from {}", mode, file_name, instance);
        Ok(file_name)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
