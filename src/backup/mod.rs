//! Backup orchestration
//!
//! - `pipeline`: [`BackupPipeline`] sequences authentication, archiving,
//!   upload and retention for one run
//! - `report`: what a run or prune did, for display and run history

mod pipeline;
mod report;

pub use pipeline::BackupPipeline;
pub use report::{FailedDelete, PruneReport, RunReport};
