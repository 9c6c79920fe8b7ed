//! Log collection for kubectl
//!
//! Collects debug API bundles, container logs and deployment manifests from
//! the workloads of a federation into a single timestamped archive.

pub mod app;
pub mod cluster;
pub mod collect;
pub mod console;
pub mod debugapi;
pub mod errors;
pub mod exit;
pub mod filesys;
pub mod logs;
pub mod staging;
pub mod storage;
pub mod utils;
