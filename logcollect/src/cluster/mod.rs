//! Cluster access through kubectl

pub mod client;
pub mod parse;

pub use client::{ClusterClient, ExecOutput, KubectlClient};
