//! Debug API client
//!
//! Workloads expose an HTTP debug server on their container port, bound to
//! loopback only. Requests are issued with `curl` executed inside the
//! workload's container through the cluster client.

use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;
use url::Url;

use crate::cluster::ClusterClient;
use crate::errors::CollectError;

const LOOPBACK: &str = "127.0.0.1";

/// Which log bundle the debug server should materialize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCollectMode {
    /// Configuration shared by every instance of a workload kind
    Common,
    /// Per-instance bundle with verbose detail
    Verbose,
    /// Per-instance bundle
    Default,
}

impl LogCollectMode {
    /// Path of the enumerate endpoint
    pub fn path(&self) -> &'static str {
        match self {
            LogCollectMode::Common => "/debug/v1/logCollect/common",
            LogCollectMode::Verbose => "/debug/v1/logCollect/verbose",
            LogCollectMode::Default => "/debug/v1/logCollect",
        }
    }

    /// Per-instance mode for the verbose flag
    pub fn per_instance(verbose: bool) -> Self {
        if verbose {
            LogCollectMode::Verbose
        } else {
            LogCollectMode::Default
        }
    }
}

impl fmt::Display for LogCollectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogCollectMode::Common => write!(f, "common"),
            LogCollectMode::Verbose => write!(f, "verbose"),
            LogCollectMode::Default => write!(f, "default"),
        }
    }
}

/// One HTTP request against the loopback debug server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRequest {
    pub method: Method,
    pub url: Url,
}

impl DebugRequest {
    /// GET against an enumerate endpoint
    pub fn enumerate(port: u16, mode: LogCollectMode) -> Result<Self, CollectError> {
        Ok(Self {
            method: Method::GET,
            url: base_url(port)?.join(mode.path()).map_err(internal)?,
        })
    }

    /// DELETE of a previously enumerated file
    pub fn delete(port: u16, file_name: &str) -> Result<Self, CollectError> {
        let mut url = base_url(port)?;
        url.path_segments_mut()
            .map_err(|_| CollectError::Internal("debug URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["debug", "v1", "delete", file_name]);
        Ok(Self {
            method: Method::DELETE,
            url,
        })
    }

    /// argv for curl: silent, but still reporting errors on stderr
    pub fn to_command(&self) -> Vec<String> {
        vec![
            "curl".to_string(),
            "-sS".to_string(),
            "-X".to_string(),
            self.method.as_str().to_string(),
            self.url.to_string(),
        ]
    }
}

fn base_url(port: u16) -> Result<Url, CollectError> {
    Url::parse(&format!("http://{}:{}/", LOOPBACK, port)).map_err(internal)
}

fn internal(err: url::ParseError) -> CollectError {
    CollectError::Internal(format!("invalid debug URL: {}", err))
}

/// Reject names that would escape the remote or local directory
pub fn validate_file_name(file_name: &str) -> Result<(), CollectError> {
    let unusable = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.chars().any(char::is_control);
    if unusable {
        return Err(CollectError::InvalidRemoteFile(file_name.to_string()));
    }
    Ok(())
}

/// Target of a debug API call: one workload container on one instance
#[derive(Debug, Clone, Copy)]
pub struct DebugTarget<'a> {
    pub federation: &'a str,
    pub instance: &'a str,
    /// Workload kind; also the name of the container serving the API
    pub container: &'a str,
    pub port: u16,
}

/// Debug API client
#[derive(Clone)]
pub struct DebugApiClient {
    cluster: Arc<dyn ClusterClient>,
}

impl DebugApiClient {
    /// Create a new debug API client on top of a cluster client
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }

    /// Ask the debug server to materialize a log bundle and return its file name
    pub async fn enumerate(
        &self,
        target: DebugTarget<'_>,
        mode: LogCollectMode,
    ) -> Result<String, CollectError> {
        let request = DebugRequest::enumerate(target.port, mode)?;
        let body = self.send(target, &request).await?;

        let file_name = body.trim().to_string();
        validate_file_name(&file_name)?;
        debug!(
            "Debug API on {} produced {} bundle {}",
            target.instance, mode, file_name
        );
        Ok(file_name)
    }

    /// Remove a bundle from the workload once it has been copied out
    pub async fn delete(&self, target: DebugTarget<'_>, file_name: &str) -> Result<(), CollectError> {
        let request = DebugRequest::delete(target.port, file_name)?;
        self.send(target, &request).await?;
        Ok(())
    }

    async fn send(
        &self,
        target: DebugTarget<'_>,
        request: &DebugRequest,
    ) -> Result<String, CollectError> {
        let command = request.to_command();
        let output = self
            .cluster
            .exec_in_container(target.federation, target.instance, target.container, &command)
            .await?;

        if !output.is_clean() {
            let stderr = if output.stderr.trim().is_empty() {
                "exec exited non-zero".to_string()
            } else {
                output.stderr.trim().to_string()
            };
            return Err(CollectError::ClusterCommand {
                command: format!("{} {}", request.method, request.url),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

impl fmt::Debug for DebugApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugApiClient").finish_non_exhaustive()
    }
}
