//! Local staging of collected artifacts

pub mod archive;
pub mod area;

pub use archive::Archiver;
pub use area::StagingArea;
