//! Process exit codes.

use crate::errors::CollectError;

/// Exit code constants.
pub mod codes {
    /// Successful collection run.
    pub const SUCCESS: i32 = 0;
    /// Federation, deployment, container or workload kind did not validate.
    pub const INVALID_SELECTION: i32 = 1;
    /// Another run holds the lock.
    pub const ALREADY_RUNNING: i32 = 2;
    /// A kubectl call or the debug API failed.
    pub const CLUSTER_ERROR: i32 = 3;
    /// Building the archive failed.
    pub const ARCHIVE_ERROR: i32 = 4;
    /// Local IO or configuration failure.
    pub const IO_ERROR: i32 = 5;
    /// Base for signal exits (128 + signal number).
    pub const SIGNAL_BASE: i32 = 128;
}

/// Map a CollectError to an exit code.
pub fn exit_code(error: &CollectError) -> i32 {
    match error {
        CollectError::InvalidSelection(_) => codes::INVALID_SELECTION,
        CollectError::AlreadyRunning { .. } => codes::ALREADY_RUNNING,
        CollectError::ClusterCommand { .. }
        | CollectError::NoPortFound { .. }
        | CollectError::InvalidRemoteFile(_) => codes::CLUSTER_ERROR,
        CollectError::Archive(_) => codes::ARCHIVE_ERROR,
        CollectError::Io(_)
        | CollectError::Json(_)
        | CollectError::Config(_)
        | CollectError::Internal(_) => codes::IO_ERROR,
    }
}

/// Exit code used when terminating on a signal.
pub fn signal_exit_code(signum: i32) -> i32 {
    codes::SIGNAL_BASE + signum
}
