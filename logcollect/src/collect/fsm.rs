//! Finite state machine for a collection run

use std::fmt;

use serde::{Deserialize, Serialize};

/// Run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// Nothing done yet
    Start,

    /// Singleton lock held
    Locked,

    /// Reading namespaces, pods and deployments from the cluster
    Discovering,

    /// Validating the operator's selection against discovered state
    Selecting,

    /// Fetching logs and manifests into the working directory
    Collecting,

    /// Building the archive
    Archiving,

    /// Lock released after a successful run
    Unlocked,

    /// Cleaning up after a failure
    Aborting,

    /// Lock released after a failed run
    Failed,
}

impl RunPhase {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Unlocked | RunPhase::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Start => "start",
            RunPhase::Locked => "locked",
            RunPhase::Discovering => "discovering",
            RunPhase::Selecting => "selecting",
            RunPhase::Collecting => "collecting",
            RunPhase::Archiving => "archiving",
            RunPhase::Unlocked => "unlocked",
            RunPhase::Aborting => "aborting",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Run event
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Singleton lock acquired
    Lock,

    /// Cluster discovery started
    Discover,

    /// Discovery done, selection validation started
    Select,

    /// Selection valid, collection started
    Collect,

    /// Collection done, archiving started
    Archive,

    /// Lock released
    Unlock,

    /// Any failure
    Abort(String),
}

/// Run FSM
#[derive(Debug, Clone)]
pub struct RunFsm {
    phase: RunPhase,
    error: Option<String>,
    history: Vec<RunPhase>,
}

impl RunFsm {
    /// Create a new FSM in the start phase
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Start,
            error: None,
            history: vec![RunPhase::Start],
        }
    }

    /// Get current phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Reason of the abort, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every phase visited, in order
    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    /// Process an event and transition phase
    pub fn process(&mut self, event: RunEvent) -> Result<RunPhase, String> {
        let next = match (self.phase, &event) {
            (RunPhase::Start, RunEvent::Lock) => RunPhase::Locked,
            (RunPhase::Locked, RunEvent::Discover) => RunPhase::Discovering,
            (RunPhase::Discovering, RunEvent::Select) => RunPhase::Selecting,
            (RunPhase::Selecting, RunEvent::Collect) => RunPhase::Collecting,
            (RunPhase::Collecting, RunEvent::Archive) => RunPhase::Archiving,
            (RunPhase::Archiving, RunEvent::Unlock) => RunPhase::Unlocked,

            (RunPhase::Aborting, RunEvent::Unlock) => RunPhase::Failed,

            (phase, RunEvent::Abort(reason))
                if !phase.is_terminal() && phase != RunPhase::Aborting =>
            {
                self.error = Some(reason.clone());
                RunPhase::Aborting
            }

            // Invalid transitions
            (phase, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", phase, event));
            }
        };

        self.phase = next;
        self.history.push(next);
        Ok(next)
    }
}

impl Default for RunFsm {
    fn default() -> Self {
        Self::new()
    }
}
