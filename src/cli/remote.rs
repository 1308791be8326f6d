//! Remote archive commands
//!
//! `list` shows every archive of the backup with its retention decision;
//! `prune` applies retention without taking a new backup.

use chrono::Utc;
use tracing::warn;

use super::{drive_pipeline, TargetArgs};
use crate::audit::{HistoryLogger, RunKind, RunRecord};
use crate::config::{BackupPaths, RemoteTarget, Settings};
use crate::display::{format_prune_summary, format_retention_plan};
use crate::error::BackupResult;

/// Handle the list command
pub fn handle_list_command(
    paths: &BackupPaths,
    settings: &Settings,
    args: TargetArgs,
) -> BackupResult<()> {
    let target = RemoteTarget::resolve(settings, &args.overrides())?;
    let title = format!(
        "Remote archives of '{}' (retention {} day(s))",
        target.backup_name, target.retention_days
    );
    let pipeline = drive_pipeline(paths, target)?;

    let now = Utc::now();
    let report = pipeline.prune(now, false)?;

    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    println!();
    print!("{}", format_retention_plan(&report.plan, now));

    Ok(())
}

/// Handle the prune command
///
/// Without `force` this only shows what would be deleted.
pub fn handle_prune_command(
    paths: &BackupPaths,
    settings: &Settings,
    args: TargetArgs,
    force: bool,
) -> BackupResult<()> {
    let target = RemoteTarget::resolve(settings, &args.overrides())?;
    let backup_name = target.backup_name.clone();
    let retention_days = target.retention_days;
    let pipeline = drive_pipeline(paths, target)?;
    let now = Utc::now();

    if !force {
        let report = pipeline.prune(now, false)?;
        let to_delete = report.plan.to_delete().len();

        if to_delete == 0 {
            println!("No archives to prune.");
            println!(
                "Retention: {} day(s), cutoff {}",
                retention_days,
                report.plan.cutoff.format("%Y-%m-%d %H:%M:%S UTC")
            );
            return Ok(());
        }

        println!("Prune Summary");
        println!("=============");
        print!("{}", format_retention_plan(&report.plan, now));
        println!();
        println!("To delete {} archive(s), run again with --force flag:", to_delete);
        println!("  drive-backup prune --force");
        return Ok(());
    }

    let history = HistoryLogger::new(paths.history_file());
    let result = pipeline.prune(now, true);

    let record = match &result {
        Ok(report) => RunRecord::from_prune(&backup_name, now, report),
        Err(e) => RunRecord::failed(RunKind::Prune, &backup_name, now, e),
    };
    if let Err(e) = history.append(&record) {
        warn!(error = %e, "Could not record run history");
    }

    let report = result?;
    print!("{}", format_prune_summary(&report));

    Ok(())
}
