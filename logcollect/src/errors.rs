//! Error types for the log collection tool

use thiserror::Error;

/// Main error type for a collection run
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("You already have an instance of the program running (pid {pid}).")]
    AlreadyRunning { pid: u32 },

    #[error("{0}")]
    InvalidSelection(String),

    #[error("`{command}` failed: {stderr}")]
    ClusterCommand { command: String, stderr: String },

    #[error("No container port declared for deployment '{deployment}' in {federation}")]
    NoPortFound {
        federation: String,
        deployment: String,
    },

    #[error("Debug API returned an unusable file name: {0:?}")]
    InvalidRemoteFile(String),

    #[error("Unable to archive files: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CollectError {
    /// Shorthand for a selection that does not match live cluster state
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        CollectError::InvalidSelection(message.into())
    }
}
