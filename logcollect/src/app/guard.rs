//! Singleton guard: one collection run per user
//!
//! The lock is a file holding the owner's PID. A record whose PID is not a
//! running process is stale and gets reclaimed. Check-then-write is not
//! atomic; two runs started in the same instant can both succeed.

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::errors::CollectError;
use crate::filesys::file::File;

/// PID lock file guard
#[derive(Debug, Clone)]
pub struct SingletonGuard {
    lock_file: File,
    pid: u32,
}

impl SingletonGuard {
    /// Guard owned by the current process
    pub fn new(lock_file: File) -> Self {
        Self::with_pid(lock_file, std::process::id())
    }

    /// Guard recording an explicit owner PID
    pub fn with_pid(lock_file: File, pid: u32) -> Self {
        Self { lock_file, pid }
    }

    pub fn lock_file(&self) -> &File {
        &self.lock_file
    }

    /// Take the lock, reclaiming it if the recorded owner is gone
    pub async fn acquire(&self) -> Result<(), CollectError> {
        if self.lock_file.exists().await {
            let record = self.lock_file.read_string().await?;
            match record.trim().parse::<u32>() {
                Ok(owner) if is_process_alive(owner) => {
                    return Err(CollectError::AlreadyRunning { pid: owner });
                }
                Ok(owner) => {
                    debug!("Reclaiming stale lock held by pid {}", owner);
                }
                Err(_) => {
                    warn!(
                        "Lock file {} is unreadable, reclaiming",
                        self.lock_file.path().display()
                    );
                }
            }
            self.lock_file.delete().await?;
        }

        self.lock_file.write_string(&self.pid.to_string()).await?;
        debug!("Acquired lock {} for pid {}", self.lock_file.path().display(), self.pid);
        Ok(())
    }

    /// Drop the lock record unconditionally
    pub async fn release(&self) -> Result<(), CollectError> {
        self.lock_file.delete().await?;
        debug!("Released lock {}", self.lock_file.path().display());
        Ok(())
    }
}

/// Whether `pid` belongs to a running process
pub fn is_process_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}
