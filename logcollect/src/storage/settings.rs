//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CollectError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Tool settings. Every field has a default so a partial (or absent)
/// settings file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// kubectl executable
    #[serde(default = "default_kubectl_path")]
    pub kubectl_path: String,

    /// The only federation collection is supported for
    #[serde(default = "default_supported_federation")]
    pub supported_federation: String,

    /// Pod-name prefixes of the workload kinds that expose the debug API
    #[serde(default = "default_workload_kinds")]
    pub workload_kinds: Vec<String>,

    /// Parent of the per-run working directory
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,

    /// Directory inside the workload container where the debug API writes files
    #[serde(default = "default_remote_log_dir")]
    pub remote_log_dir: String,

    /// Lock file name, relative to the home directory
    #[serde(default = "default_lock_file_name")]
    pub lock_file_name: String,

    /// Where the archive is written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_kubectl_path() -> String {
    "kubectl".to_string()
}

fn default_supported_federation() -> String {
    "fed-amf".to_string()
}

fn default_workload_kinds() -> Vec<String> {
    vec!["amf-cc".to_string(), "amf-n2".to_string()]
}

fn default_staging_root() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_remote_log_dir() -> String {
    "/tmp".to_string()
}

fn default_lock_file_name() -> String {
    ".lockfile.vestibular.lock".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_json: false,
            kubectl_path: default_kubectl_path(),
            supported_federation: default_supported_federation(),
            workload_kinds: default_workload_kinds(),
            staging_root: default_staging_root(),
            remote_log_dir: default_remote_log_dir(),
            lock_file_name: default_lock_file_name(),
            output_dir: default_output_dir(),
        }
    }
}

impl Settings {
    /// Load settings from `file`, falling back to defaults when it is absent
    pub async fn load(file: &File) -> Result<Self, CollectError> {
        if !file.exists().await {
            debug!("No settings file at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }

        let settings: Settings = file.read_json().await?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the orchestrator cannot work with
    pub fn validate(&self) -> Result<(), CollectError> {
        if self.supported_federation.is_empty() {
            return Err(CollectError::Config(
                "supported_federation must not be empty".to_string(),
            ));
        }
        if self.workload_kinds.iter().any(|kind| kind.is_empty()) {
            return Err(CollectError::Config(
                "workload_kinds must not contain empty prefixes".to_string(),
            ));
        }
        if self.lock_file_name.is_empty() {
            return Err(CollectError::Config(
                "lock_file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
