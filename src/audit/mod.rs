//! Run history for drive-backup
//!
//! Every `run` and applied `prune` appends one [`RunRecord`] to an
//! append-only JSONL file (`history.jsonl` in the config directory), so
//! unattended scheduled runs leave a trail that `drive-backup history`
//! can show.
//!
//! # Example
//!
//! ```rust,ignore
//! use drive_backup::audit::{HistoryLogger, RunRecord};
//!
//! let logger = HistoryLogger::new(paths.history_file());
//! logger.append(&RunRecord::from_run("nightly", started_at, &report))?;
//!
//! for record in logger.read_recent(10)? {
//!     println!("{} {}", record.started_at, record.outcome);
//! }
//! ```

mod logger;
mod record;

pub use logger::HistoryLogger;
pub use record::{RunKind, RunOutcome, RunRecord};
