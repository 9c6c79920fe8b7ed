//! In-workload HTTP debug API

pub mod client;

pub use client::{DebugApiClient, DebugRequest, DebugTarget, LogCollectMode};
