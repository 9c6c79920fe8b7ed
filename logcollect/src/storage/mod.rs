//! Persistent configuration and per-user paths

pub mod layout;
pub mod settings;
