pub mod orchestrator;
pub mod report;

pub use orchestrator::{Pipeline, PlannedArchive};
pub use report::{ArchiveFailure, ArchiveOutcome, FailureStage, RunOutcome, RunReport};
