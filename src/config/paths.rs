//! Path management for drive-backup
//!
//! Provides platform-aware path resolution for the config file, the
//! persisted session, the client secrets, run history and the local
//! staging directory where archives are built.
//!
//! ## Path Resolution Order
//!
//! 1. `DRIVE_BACKUP_CONFIG_DIR` environment variable (if set)
//! 2. The platform config directory from `directories`
//!    (`~/.config/drive-backup` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BackupError;

/// Environment variable overriding the base directory
pub const CONFIG_DIR_ENV: &str = "DRIVE_BACKUP_CONFIG_DIR";

/// Manages all paths used by drive-backup
#[derive(Debug, Clone)]
pub struct BackupPaths {
    /// Base directory for all drive-backup state
    base_dir: PathBuf,
}

impl BackupPaths {
    /// Create a new BackupPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and no
    /// override is set.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create BackupPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the persisted session (`token.json`)
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("token.json")
    }

    /// Get the path to the OAuth client secrets (`credentials.json`)
    pub fn client_secrets_file(&self) -> PathBuf {
        self.base_dir.join("credentials.json")
    }

    /// Get the path to the run history log
    pub fn history_file(&self) -> PathBuf {
        self.base_dir.join("history.jsonl")
    }

    /// Get the staging directory where archives are built before upload
    pub fn staging_dir(&self) -> PathBuf {
        self.base_dir.join("staging")
    }

    /// Ensure the base and staging directories exist
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.staging_dir()).map_err(|e| {
            BackupError::Io(format!("Failed to create staging directory: {}", e))
        })?;

        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, BackupError> {
    ProjectDirs::from("", "", "drive-backup")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| BackupError::Config("Could not determine home directory".into()))
}
