//! Directory operations

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::CollectError;
use crate::filesys::file::File;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as the archive root entry
    pub fn base_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and parents). Succeeds if it already exists.
    pub async fn create(&self) -> Result<(), CollectError> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Delete the directory and all contents
    pub async fn delete(&self) -> Result<(), CollectError> {
        ignore_missing(fs::remove_dir_all(&self.path).await)
    }

    /// Blocking `delete`, for the signal path
    pub fn delete_blocking(&self) -> Result<(), CollectError> {
        ignore_missing(std::fs::remove_dir_all(&self.path))
    }

    /// Get a file within this directory
    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }
}

fn ignore_missing(result: std::io::Result<()>) -> Result<(), CollectError> {
    match result {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
