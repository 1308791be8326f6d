//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup pipeline.

pub mod auth;
pub mod config;
pub mod history;
pub mod remote;
pub mod run;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Args;

use crate::auth::{GoogleOAuth, SessionAuthenticator};
use crate::backup::BackupPipeline;
use crate::config::{BackupPaths, ConfigOverrides, RemoteTarget};
use crate::error::BackupResult;
use crate::remote::DriveClient;

pub use auth::handle_auth_command;
pub use config::handle_config_command;
pub use history::handle_history_command;
pub use remote::{handle_list_command, handle_prune_command};
pub use run::handle_run_command;

/// Options naming the remote archive set
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Naming prefix for archives
    #[arg(short = 'n', long, env = "BACKUP_NAME")]
    pub backup_name: Option<String>,

    /// Drive folder id receiving the archives
    #[arg(short = 'f', long = "folder-id", env = "GDRIVE_FOLDER_ID")]
    pub folder_id: Option<String>,

    /// Days an archive is kept before it is pruned
    #[arg(short, long, env = "RETENTION_DAYS")]
    pub retention_days: Option<u32>,
}

impl TargetArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source_folder: None,
            backup_name: self.backup_name.clone(),
            destination_folder_id: self.folder_id.clone(),
            retention_days: self.retention_days,
        }
    }
}

/// Options of a full backup run
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Directory to back up
    #[arg(short, long, env = "SOURCE_FOLDER")]
    pub source: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source_folder: self.source.clone(),
            ..self.target.overrides()
        }
    }
}

/// Pipeline wired to Google Drive and the session files under `paths`
pub type DrivePipeline = BackupPipeline<SessionAuthenticator<GoogleOAuth>, DriveClient>;

pub(crate) fn authenticator(
    paths: &BackupPaths,
    interactive: bool,
) -> BackupResult<SessionAuthenticator<GoogleOAuth>> {
    Ok(SessionAuthenticator::new(
        GoogleOAuth::new()?,
        paths.session_file(),
        paths.client_secrets_file(),
    )
    .interactive(interactive))
}

pub(crate) fn drive_pipeline(paths: &BackupPaths, target: RemoteTarget) -> BackupResult<DrivePipeline> {
    let store = DriveClient::new(target.retry, target.chunk_size)?;
    // Scheduled runs have no terminal to show a consent URL on
    let interactive = std::io::stdout().is_terminal();
    Ok(BackupPipeline::new(authenticator(paths, interactive)?, store, target))
}
