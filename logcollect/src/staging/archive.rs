//! Archive builder: packs the working directory into one tarball

use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{error, info};

use crate::errors::CollectError;
use crate::filesys::file::File;
use crate::staging::area::StagingArea;

/// Writes `{federation}-Logs_{timestamp}.tar.gz` into an output directory
#[derive(Debug, Clone)]
pub struct Archiver {
    output_dir: PathBuf,
}

impl Archiver {
    /// Create an archiver writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Archive file name for a federation at a Unix timestamp
    pub fn archive_name(federation: &str, timestamp: i64) -> String {
        format!("{}-Logs_{}.tar.gz", federation, timestamp)
    }

    /// Archive the working directory stamped with the current time
    pub async fn archive(
        &self,
        staging: &StagingArea,
        federation: &str,
    ) -> Result<PathBuf, CollectError> {
        self.archive_at(staging, federation, chrono::Utc::now().timestamp())
            .await
    }

    /// Archive the working directory, then purge it. The working directory
    /// is purged whether or not the archive could be written.
    pub async fn archive_at(
        &self,
        staging: &StagingArea,
        federation: &str,
        timestamp: i64,
    ) -> Result<PathBuf, CollectError> {
        let archive_path = self
            .output_dir
            .join(Self::archive_name(federation, timestamp));

        match self.build(staging, &archive_path).await {
            Ok(()) => {
                info!("Archived {} into {}", staging.path().display(), archive_path.display());
                staging.purge().await?;
                Ok(archive_path)
            }
            Err(reason) => {
                error!("Archiving {} failed: {}", staging.path().display(), reason);
                if let Err(e) = File::new(&archive_path).delete().await {
                    error!("Failed to remove partial archive: {}", e);
                }
                if let Err(e) = staging.purge().await {
                    error!("Failed to purge working directory: {}", e);
                }
                Err(CollectError::Archive(reason))
            }
        }
    }

    async fn build(&self, staging: &StagingArea, archive_path: &Path) -> Result<(), String> {
        let root_name = staging
            .dir()
            .base_name()
            .ok_or_else(|| format!("{} has no base name", staging.path().display()))?
            .to_string();
        let source = staging.path().to_path_buf();
        let target = archive_path.to_path_buf();

        tokio::task::spawn_blocking(move || write_tarball(&source, &root_name, &target))
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())
    }
}

fn write_tarball(source: &Path, root_name: &str, target: &Path) -> std::io::Result<()> {
    let file = std::fs::File::create(target)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.append_dir_all(root_name, source)?;
    builder.into_inner()?.finish()?;
    Ok(())
}
