//! Working directory for a single collection run

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::CollectError;
use crate::filesys::dir::Dir;

/// Private staging directory, one per run, named after the federation
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: Dir,
}

impl StagingArea {
    /// Working directory `{staging_root}/{federation}`
    pub fn new(staging_root: impl AsRef<Path>, federation: &str) -> Self {
        Self {
            dir: Dir::new(staging_root.as_ref().join(federation)),
        }
    }

    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location of a staged file
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.file(name).path().to_path_buf()
    }

    pub async fn exists(&self) -> bool {
        self.dir.exists().await
    }

    /// Create the working directory if absent
    pub async fn ensure_dir(&self) -> Result<(), CollectError> {
        self.dir.create().await
    }

    /// Create or truncate a staged file
    pub async fn write_string(&self, name: &str, contents: &str) -> Result<(), CollectError> {
        self.ensure_dir().await?;
        self.dir.file(name).write_string(contents).await
    }

    /// Remove the working directory and everything in it
    pub async fn purge(&self) -> Result<(), CollectError> {
        debug!("Purging working directory {}", self.path().display());
        self.dir.delete().await
    }

    /// Name of the pod inventory file
    pub fn pod_inventory_name(federation: &str) -> String {
        format!("{}-podsInformation.txt", federation)
    }

    /// Name of a container log dump
    pub fn debug_log_name(federation: &str, instance: &str, container: &str) -> String {
        format!("{}-{}-{}-debugLogs.txt", federation, instance, container)
    }

    /// Name of a deployment manifest dump
    pub fn manifest_name(federation: &str, deployment: &str) -> String {
        format!("{}-{}-deployment.yaml", federation, deployment)
    }
}
