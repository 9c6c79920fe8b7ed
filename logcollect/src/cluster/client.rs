//! Cluster client: the kubectl calls the collector depends on

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::cluster::parse;
use crate::errors::CollectError;

/// Captured output of a command executed inside a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// Whether the exec call itself exited zero
    pub success: bool,
}

impl ExecOutput {
    /// An exec only counts as successful with a zero exit and an empty
    /// error stream
    pub fn is_clean(&self) -> bool {
        self.success && self.stderr.trim().is_empty()
    }
}

/// Cluster client trait for testability
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Names of all namespaces in the cluster
    async fn list_namespaces(&self) -> Result<Vec<String>, CollectError>;

    /// Names of all deployments in the federation
    async fn list_deployments(&self, federation: &str) -> Result<Vec<String>, CollectError>;

    /// Names of all pods in the federation
    async fn list_pods(&self, federation: &str) -> Result<Vec<String>, CollectError>;

    /// Pod / container / image table, unparsed
    async fn list_pod_inventory(&self, federation: &str) -> Result<String, CollectError>;

    /// First container port declared by the deployment
    async fn get_exposed_port(&self, federation: &str, deployment: &str)
        -> Result<u16, CollectError>;

    /// Container names inside the deployment's pods; may be empty
    async fn list_worker_containers(
        &self,
        federation: &str,
        deployment: &str,
    ) -> Result<Vec<String>, CollectError>;

    /// Deployment manifest as YAML
    async fn get_deployment_manifest(
        &self,
        federation: &str,
        deployment: &str,
    ) -> Result<String, CollectError>;

    /// Log output of one container
    async fn get_container_logs(
        &self,
        federation: &str,
        instance: &str,
        container: &str,
    ) -> Result<String, CollectError>;

    /// Run `command` inside a container and capture both streams
    async fn exec_in_container(
        &self,
        federation: &str,
        instance: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, CollectError>;

    /// Copy `remote_path` out of the container to `local_path`
    async fn copy_file_from_container(
        &self,
        federation: &str,
        instance: &str,
        container: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), CollectError>;
}

/// Cluster client backed by the kubectl binary
#[derive(Debug, Clone)]
pub struct KubectlClient {
    kubectl_path: String,
}

impl KubectlClient {
    /// Create a client invoking the given kubectl executable
    pub fn new(kubectl_path: impl Into<String>) -> Self {
        Self {
            kubectl_path: kubectl_path.into(),
        }
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.kubectl_path, args.join(" "))
    }

    async fn output(&self, args: &[String]) -> Result<std::process::Output, CollectError> {
        let command = self.describe(args);
        debug!("Running: {}", command);

        Command::new(&self.kubectl_path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CollectError::ClusterCommand {
                command,
                stderr: format!("failed to spawn: {}", e),
            })
    }

    /// Run a listing. Fails on a non-zero exit or any stderr output, since
    /// a listing with warnings cannot be trusted to be complete.
    async fn run(&self, args: &[String]) -> Result<String, CollectError> {
        self.run_with(args, StderrPolicy::Fail).await
    }

    /// Run a fetch or copy. Only the exit status decides; `kubectl cp` warns
    /// on stderr for absolute source paths.
    async fn run_status_only(&self, args: &[String]) -> Result<String, CollectError> {
        self.run_with(args, StderrPolicy::Ignore).await
    }

    async fn run_with(&self, args: &[String], policy: StderrPolicy) -> Result<String, CollectError> {
        let output = self.output(args).await?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        let failed = match policy {
            StderrPolicy::Fail => !stderr.is_empty() || !output.status.success(),
            StderrPolicy::Ignore => !output.status.success(),
        };
        if failed {
            let stderr = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(CollectError::ClusterCommand {
                command: self.describe(args),
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!("Ignoring stderr of {}: {}", self.describe(args), stderr);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StderrPolicy {
    Fail,
    Ignore,
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

#[async_trait]
impl ClusterClient for KubectlClient {
    async fn list_namespaces(&self) -> Result<Vec<String>, CollectError> {
        let output = self.run(&args(["get", "namespaces"])).await?;
        Ok(parse::first_column(&output))
    }

    async fn list_deployments(&self, federation: &str) -> Result<Vec<String>, CollectError> {
        let output = self.run(&args(["get", "deployment", "-n", federation])).await?;
        Ok(parse::first_column(&output))
    }

    async fn list_pods(&self, federation: &str) -> Result<Vec<String>, CollectError> {
        let output = self
            .run(&args([
                "get",
                "po",
                "-o",
                "custom-columns=POD:.metadata.name",
                "-n",
                federation,
            ]))
            .await?;
        Ok(parse::first_column(&output))
    }

    async fn list_pod_inventory(&self, federation: &str) -> Result<String, CollectError> {
        self.run_status_only(&args([
            "get",
            "po",
            "-o",
            "custom-columns=POD:.metadata.name,CONTAINER:.spec.containers[*].name,IMAGE:.spec.containers[*].image",
            "-n",
            federation,
        ]))
        .await
    }

    async fn get_exposed_port(
        &self,
        federation: &str,
        deployment: &str,
    ) -> Result<u16, CollectError> {
        let manifest = self.get_deployment_manifest(federation, deployment).await?;
        parse::container_port(&manifest).ok_or_else(|| CollectError::NoPortFound {
            federation: federation.to_string(),
            deployment: deployment.to_string(),
        })
    }

    async fn list_worker_containers(
        &self,
        federation: &str,
        deployment: &str,
    ) -> Result<Vec<String>, CollectError> {
        let output = self
            .run(&args([
                "get",
                "po",
                "-o",
                "custom-columns=POD:.metadata.name,CONTAINER:.spec.containers[*].name",
                "-n",
                federation,
            ]))
            .await?;
        Ok(parse::worker_containers(&output, deployment))
    }

    async fn get_deployment_manifest(
        &self,
        federation: &str,
        deployment: &str,
    ) -> Result<String, CollectError> {
        self.run_status_only(&args(["get", "deployment", "-n", federation, deployment, "-o", "yaml"]))
            .await
    }

    async fn get_container_logs(
        &self,
        federation: &str,
        instance: &str,
        container: &str,
    ) -> Result<String, CollectError> {
        self.run_status_only(&args(["logs", instance, "-n", federation, "-c", container]))
            .await
    }

    async fn exec_in_container(
        &self,
        federation: &str,
        instance: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, CollectError> {
        let mut exec_args = args(["exec", "-n", federation, instance, "-c", container, "--"]);
        exec_args.extend(command.iter().cloned());

        let output = self.output(&exec_args).await?;
        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }

    async fn copy_file_from_container(
        &self,
        federation: &str,
        instance: &str,
        container: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), CollectError> {
        let source = format!("{}/{}:{}", federation, instance, remote_path);
        let target = local_path.to_string_lossy().into_owned();
        self.run_status_only(&args(["cp", &source, &target, "-c", container]))
            .await?;
        Ok(())
    }
}
