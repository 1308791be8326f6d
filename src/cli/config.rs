//! Configuration command
//!
//! Shows the paths and settings in effect and, with `--save`, persists the
//! values given as flags or environment variables into `config.json`.

use std::fmt::Display;

use super::RunArgs;
use crate::archive::validate_backup_name;
use crate::config::{BackupPaths, Settings};
use crate::error::BackupResult;

/// Handle the config command
pub fn handle_config_command(
    paths: &BackupPaths,
    settings: &Settings,
    args: RunArgs,
    save: bool,
) -> BackupResult<()> {
    let settings = if save {
        let updated = apply_overrides(settings, args)?;
        updated.save(paths)?;
        println!("Settings saved to {}", paths.settings_file().display());
        println!();
        updated
    } else {
        settings.clone()
    };

    println!("drive-backup Configuration");
    println!("==========================");
    println!("Config directory:   {}", paths.base_dir().display());
    println!("Settings file:      {}", paths.settings_file().display());
    println!("Session file:       {}", paths.session_file().display());
    println!("Client secrets:     {}", paths.client_secrets_file().display());
    println!("Run history:        {}", paths.history_file().display());
    println!();
    println!("Settings:");
    println!(
        "  Source folder:    {}",
        or_unset(settings.source_folder.as_ref().map(|p| p.display()))
    );
    println!("  Backup name:      {}", or_unset(settings.backup_name.as_ref()));
    println!(
        "  Drive folder id:  {}",
        or_unset(settings.destination_folder_id.as_ref())
    );
    println!("  Retention days:   {}", settings.retention_days);
    println!(
        "  Staging dir:      {}",
        settings
            .staging_dir
            .clone()
            .unwrap_or_else(|| paths.staging_dir())
            .display()
    );
    println!(
        "  Upload:           {} attempt(s), {} MiB chunks",
        settings.upload.max_attempts, settings.upload.chunk_size_mib
    );

    Ok(())
}

/// Settings with every given override written in
fn apply_overrides(settings: &Settings, args: RunArgs) -> BackupResult<Settings> {
    let mut updated = settings.clone();

    if let Some(source) = args.source {
        updated.source_folder = Some(source);
    }
    if let Some(name) = args.target.backup_name {
        validate_backup_name(&name)?;
        updated.backup_name = Some(name);
    }
    if let Some(folder_id) = args.target.folder_id {
        updated.destination_folder_id = Some(folder_id);
    }
    if let Some(days) = args.target.retention_days {
        updated.retention_days = days;
    }

    Ok(updated)
}

fn or_unset<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}
