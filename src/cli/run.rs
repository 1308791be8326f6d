//! Backup run command
//!
//! Runs the full pipeline once and records the outcome in the run history.

use chrono::Utc;
use tracing::{info, warn};

use super::{drive_pipeline, RunArgs};
use crate::archive::Archiver;
use crate::audit::{HistoryLogger, RunKind, RunOutcome, RunRecord};
use crate::config::{BackupConfig, BackupPaths, Settings};
use crate::display::format_run_summary;
use crate::error::BackupResult;

/// Handle the run command
///
/// Returns [`RunOutcome::Partial`] when the upload succeeded but retention
/// could not run; the caller turns that into a distinct exit status.
pub fn handle_run_command(
    paths: &BackupPaths,
    settings: &Settings,
    args: RunArgs,
) -> BackupResult<RunOutcome> {
    let config = BackupConfig::resolve(settings, args.overrides(), paths)?;
    let backup_name = config.target.backup_name.clone();
    let archiver = Archiver::new(config.staging_dir.clone());
    let history = HistoryLogger::new(paths.history_file());

    let started_at = Utc::now();
    info!(
        source = %config.source_folder.display(),
        backup = %backup_name,
        retention_days = config.target.retention_days,
        "Starting backup"
    );

    let result = drive_pipeline(paths, config.target)
        .and_then(|pipeline| pipeline.run(&config.source_folder, &archiver, started_at));

    let record = match &result {
        Ok(report) => RunRecord::from_run(&backup_name, started_at, report),
        Err(e) => RunRecord::failed(RunKind::Backup, &backup_name, started_at, e),
    };
    if let Err(e) = history.append(&record) {
        warn!(error = %e, "Could not record run history");
    }

    let report = result?;
    print!("{}", format_run_summary(&report));

    Ok(record.outcome)
}
