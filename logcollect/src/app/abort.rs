//! Signal-driven abort
//!
//! An interrupt or suspend request cancels the run: the runner drops the
//! in-flight collection, purges the working directory and exits with
//! `128 + signum`. The singleton lock is left behind; the next run reclaims
//! it as stale.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{error, warn};

use crate::console;
use crate::errors::CollectError;
use crate::exit::signal_exit_code;
use crate::filesys::dir::Dir;

/// The only state shared between the orchestrator and the abort path: the
/// working directory, published once it is known
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    working_dir: Arc<OnceLock<PathBuf>>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the working directory. Only the first call has an effect.
    pub fn publish(&self, working_dir: impl Into<PathBuf>) {
        let working_dir = working_dir.into();
        if self.working_dir.set(working_dir.clone()).is_err() {
            warn!(
                "Working directory already published, ignoring {}",
                working_dir.display()
            );
        }
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.get().map(PathBuf::as_path)
    }

    /// Remove the working directory if one was published. Returns whether
    /// something was removed.
    pub fn fire(&self) -> bool {
        let Some(path) = self.working_dir() else {
            return false;
        };
        if !path.exists() {
            return false;
        }
        match Dir::new(path).delete_blocking() {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to remove {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// SIGINT and SIGTSTP receivers. Handlers are registered on install, so a
/// signal arriving before [`AbortSignals::recv`] is polled is not lost.
#[derive(Debug)]
pub struct AbortSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    suspend: tokio::signal::unix::Signal,
}

impl AbortSignals {
    #[cfg(unix)]
    pub fn install() -> Result<Self, CollectError> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            suspend: signal(SignalKind::from_raw(libc::SIGTSTP))?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self, CollectError> {
        Ok(Self {})
    }

    /// Wait for the next abort request and return its signal number
    #[cfg(unix)]
    pub async fn recv(&mut self) -> i32 {
        tokio::select! {
            _ = self.interrupt.recv() => libc::SIGINT,
            _ = self.suspend.recv() => libc::SIGTSTP,
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> i32 {
        match tokio::signal::ctrl_c().await {
            Ok(()) => 2,
            Err(_) => std::future::pending().await,
        }
    }
}

/// Purge after the run has been cancelled and return the exit code. The
/// collection future must already be dropped so nothing recreates the
/// working directory.
pub fn terminate(handle: &AbortHandle, signum: i32) -> i32 {
    handle.fire();
    console::notice("\nUser interrupt captured.\nCleaning up and exiting...");
    signal_exit_code(signum)
}
