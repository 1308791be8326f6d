//! Run history command

use crate::audit::HistoryLogger;
use crate::config::BackupPaths;
use crate::display::format_history;
use crate::error::BackupResult;

/// Handle the history command
pub fn handle_history_command(paths: &BackupPaths, limit: usize) -> BackupResult<()> {
    let logger = HistoryLogger::new(paths.history_file());
    let records = logger.read_recent(limit)?;

    println!("{}", format_history(&records));
    Ok(())
}
