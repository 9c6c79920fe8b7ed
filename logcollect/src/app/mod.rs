//! Application wiring: CLI options, singleton guard, abort handler, run

pub mod abort;
pub mod guard;
pub mod options;
pub mod run;
