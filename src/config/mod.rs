//! Configuration module for drive-backup
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - Settings persistence (`config.json`)
//! - Resolution of flags, environment and settings into one [`BackupConfig`]
//!
//! The resolved [`BackupConfig`] is built once at startup and passed
//! explicitly to every component.

pub mod paths;
pub mod settings;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

pub use paths::BackupPaths;
pub use settings::{Settings, UploadSettings, DEFAULT_RETENTION_DAYS};

use crate::archive::naming::validate_backup_name;
use crate::error::{BackupError, BackupResult};
use crate::remote::RetryPolicy;
use crate::retention::RetentionPolicy;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_folder: Option<PathBuf>,
    pub backup_name: Option<String>,
    pub destination_folder_id: Option<String>,
    pub retention_days: Option<u32>,
}

/// Where archives live remotely and how long they are kept
///
/// This is all the `list` and `prune` commands need; a full run adds the
/// local side in [`BackupConfig`].
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    /// Archive naming prefix (validated)
    pub backup_name: String,
    /// Drive folder id receiving the archives
    pub destination_folder_id: String,
    /// Retention window in days
    pub retention_days: u32,
    /// Retry policy for remote calls
    pub retry: RetryPolicy,
    /// Resumable upload chunk size in bytes
    pub chunk_size: usize,
}

impl RemoteTarget {
    /// Merge overrides on top of the settings file, without touching disk
    pub fn resolve(settings: &Settings, overrides: &ConfigOverrides) -> BackupResult<Self> {
        let backup_name = overrides
            .backup_name
            .clone()
            .or_else(|| settings.backup_name.clone())
            .filter(|name| !name.is_empty())
            .ok_or(BackupError::ConfigMissing("backup_name"))?;
        validate_backup_name(&backup_name)?;

        let destination_folder_id = overrides
            .destination_folder_id
            .clone()
            .or_else(|| settings.destination_folder_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or(BackupError::ConfigMissing("destination_folder_id"))?;

        let retention_days = overrides.retention_days.unwrap_or(settings.retention_days);
        RetentionPolicy::new(retention_days).cutoff(Utc::now())?;

        let upload = &settings.upload;
        if upload.max_attempts == 0 {
            return Err(BackupError::Config(
                "upload.max_attempts must be at least 1".into(),
            ));
        }
        if upload.chunk_size_mib == 0 {
            return Err(BackupError::Config(
                "upload.chunk_size_mib must be at least 1".into(),
            ));
        }

        Ok(Self {
            backup_name,
            destination_folder_id,
            retention_days,
            retry: RetryPolicy::new(
                upload.max_attempts,
                Duration::from_millis(upload.initial_backoff_ms),
            ),
            // Whole MiB keeps every chunk a multiple of Drive's 256 KiB unit
            chunk_size: upload.chunk_size_mib as usize * 1024 * 1024,
        })
    }
}

/// Fully resolved configuration for one backup run
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Directory to back up
    pub source_folder: PathBuf,
    /// Where archives are built before upload
    pub staging_dir: PathBuf,
    /// Remote side of the run
    pub target: RemoteTarget,
}

impl BackupConfig {
    /// Merge overrides on top of the settings file
    ///
    /// Performs no I/O: a missing required value fails with
    /// [`BackupError::ConfigMissing`] before anything touches disk or network.
    pub fn resolve(
        settings: &Settings,
        overrides: ConfigOverrides,
        paths: &BackupPaths,
    ) -> BackupResult<Self> {
        let source_folder = overrides
            .source_folder
            .clone()
            .or_else(|| settings.source_folder.clone())
            .ok_or(BackupError::ConfigMissing("source_folder"))?;

        let target = RemoteTarget::resolve(settings, &overrides)?;

        Ok(Self {
            source_folder,
            staging_dir: settings
                .staging_dir
                .clone()
                .unwrap_or_else(|| paths.staging_dir()),
            target,
        })
    }
}
