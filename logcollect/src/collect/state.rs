//! Per-run mutable state

use std::collections::BTreeMap;

use tracing::debug;

use crate::collect::fsm::{RunEvent, RunFsm, RunPhase};
use crate::errors::CollectError;

/// Tracks, per workload kind, whether the common configuration bundle has
/// been fetched during this run. Flags only ever go from false to true.
#[derive(Debug, Clone, Default)]
pub struct CommonConfigTracker {
    fetched: BTreeMap<String, bool>,
}

impl CommonConfigTracker {
    /// All kinds start unfetched
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fetched: kinds.into_iter().map(|kind| (kind.into(), false)).collect(),
        }
    }

    pub fn is_fetched(&self, kind: &str) -> bool {
        self.fetched.get(kind).copied().unwrap_or(false)
    }

    pub fn mark_fetched(&mut self, kind: &str) {
        self.fetched.insert(kind.to_string(), true);
    }

    /// Kinds whose common bundle has been fetched
    pub fn fetched_kinds(&self) -> Vec<&str> {
        self.fetched
            .iter()
            .filter(|(_, fetched)| **fetched)
            .map(|(kind, _)| kind.as_str())
            .collect()
    }
}

/// State owned by one run and passed down by reference
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub fsm: RunFsm,
    pub common: CommonConfigTracker,
}

impl RunState {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fsm: RunFsm::new(),
            common: CommonConfigTracker::new(kinds),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.fsm.phase()
    }

    /// Apply a phase transition
    pub fn advance(&mut self, event: RunEvent) -> Result<RunPhase, CollectError> {
        let from = self.fsm.phase();
        let to = self.fsm.process(event).map_err(CollectError::Internal)?;
        debug!("Run phase {} -> {}", from, to);
        Ok(to)
    }
}
