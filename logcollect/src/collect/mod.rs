//! Log collection: run phases, selection and orchestration

pub mod collector;
pub mod fsm;
pub mod orchestrator;
pub mod selection;
pub mod state;

pub use orchestrator::{CollectionReport, Orchestrator, OrchestratorOptions};
pub use selection::Selection;
