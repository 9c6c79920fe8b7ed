//! Container log, manifest and inventory dumps

use std::sync::Arc;

use tracing::debug;

use crate::cluster::ClusterClient;
use crate::errors::CollectError;
use crate::staging::area::StagingArea;

/// Writes kubectl-sourced artifacts into the working directory. Every
/// write replaces any previous file with the same name.
#[derive(Clone)]
pub struct ArtifactCollector {
    cluster: Arc<dyn ClusterClient>,
}

impl ArtifactCollector {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }

    /// Dump one container's logs
    pub async fn store_debug_logs(
        &self,
        staging: &StagingArea,
        federation: &str,
        instance: &str,
        container: &str,
    ) -> Result<String, CollectError> {
        let logs = self
            .cluster
            .get_container_logs(federation, instance, container)
            .await?;
        let name = StagingArea::debug_log_name(federation, instance, container);
        staging.write_string(&name, &logs).await?;
        debug!("Stored {} bytes of logs in {}", logs.len(), name);
        Ok(name)
    }

    /// Dump a deployment manifest
    pub async fn store_deployment(
        &self,
        staging: &StagingArea,
        federation: &str,
        deployment: &str,
    ) -> Result<String, CollectError> {
        let manifest = self
            .cluster
            .get_deployment_manifest(federation, deployment)
            .await?;
        let name = StagingArea::manifest_name(federation, deployment);
        staging.write_string(&name, &manifest).await?;
        debug!("Stored manifest {}", name);
        Ok(name)
    }

    /// Store the pod inventory captured during discovery
    pub async fn store_pod_inventory(
        &self,
        staging: &StagingArea,
        federation: &str,
        inventory: &str,
    ) -> Result<String, CollectError> {
        let name = StagingArea::pod_inventory_name(federation);
        staging.write_string(&name, inventory).await?;
        Ok(name)
    }
}

impl std::fmt::Debug for ArtifactCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCollector").finish_non_exhaustive()
    }
}
