//! User settings for drive-backup
//!
//! Settings are read from `config.json` in the config directory. Every field
//! is optional on disk; command-line flags and environment variables take
//! precedence over the file (see [`super::BackupConfig::resolve`]).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::error::BackupError;
use crate::storage::file_io::write_json_atomic;

/// Default retention window in days
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Upload transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Maximum attempts per HTTP call before a transient failure becomes fatal
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each following attempt
    pub initial_backoff_ms: u64,
    /// Resumable upload chunk size in MiB
    pub chunk_size_mib: u32,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 500,
            chunk_size_mib: 8,
        }
    }
}

/// User settings for drive-backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Directory to back up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_folder: Option<PathBuf>,

    /// Naming prefix for archives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_name: Option<String>,

    /// Drive folder receiving the archives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_folder_id: Option<String>,

    /// Days an archive is kept before it becomes eligible for deletion
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Directory where archives are staged (defaults to `<config>/staging`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    /// Upload transport settings
    #[serde(default)]
    pub upload: UploadSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            source_folder: None,
            backup_name: None,
            destination_folder_id: None,
            retention_days: default_retention_days(),
            staging_dir: None,
            upload: UploadSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_default(paths: &BackupPaths) -> Result<Self, BackupError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| BackupError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| BackupError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BackupPaths) -> Result<(), BackupError> {
        write_json_atomic(paths.settings_file(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.retention_days, 7);
        assert!(settings.backup_name.is_none());
        assert_eq!(settings.upload.max_attempts, 5);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings::load_or_default(&paths).unwrap();
        assert_eq!(settings.retention_days, DEFAULT_RETENTION_DAYS);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings {
            backup_name: Some("nightly".into()),
            retention_days: 14,
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_default(&paths).unwrap();
        assert_eq!(loaded.backup_name.as_deref(), Some("nightly"));
        assert_eq!(loaded.retention_days, 14);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"backup_name": "db"}"#).unwrap();

        let loaded = Settings::load_or_default(&paths).unwrap();
        assert_eq!(loaded.backup_name.as_deref(), Some("db"));
        assert_eq!(loaded.retention_days, 7);
        assert_eq!(loaded.upload, UploadSettings::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_default(&paths).unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
    }
}
