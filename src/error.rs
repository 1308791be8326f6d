//! Custom error types for drive-backup
//!
//! This module defines the error hierarchy for the backup pipeline using
//! thiserror. Each variant maps to one failure kind of the pipeline stages;
//! `is_fatal` tells the retention pass whether a failed delete stops it or
//! is recorded and skipped.

use thiserror::Error;

/// The main error type for drive-backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// A required setting was not provided by flags, environment or config file
    #[error("Missing required setting: {0}")]
    ConfigMissing(&'static str),

    /// A setting was provided but is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source directory (or a file under it) could not be read
    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    /// The archive container could not be written
    #[error("Archive error: {0}")]
    Archive(String),

    /// No valid session could be obtained
    #[error("Authorization failed: {0}")]
    AuthFailure(String),

    /// Upload failed, either transiently (network, quota) or permanently
    #[error("Upload failed ({}): {message}", failure_kind(.transient))]
    UploadFailure { message: String, transient: bool },

    /// The remote listing could not be fetched
    #[error("Listing remote archives failed: {0}")]
    ListFailure(String),

    /// A single remote delete failed
    #[error("Failed to delete remote item {remote_id}: {message}")]
    DeleteFailure { remote_id: String, message: String },

    /// A remote item name does not follow the archive naming pattern
    #[error("Malformed archive name '{name}': {reason}")]
    MalformedRemoteName { name: String, reason: String },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Local state file errors (session, history)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BackupError {
    /// Create a transient upload failure
    pub fn upload_transient(message: impl Into<String>) -> Self {
        Self::UploadFailure {
            message: message.into(),
            transient: true,
        }
    }

    /// Create a permanent upload failure
    pub fn upload_permanent(message: impl Into<String>) -> Self {
        Self::UploadFailure {
            message: message.into(),
            transient: false,
        }
    }

    /// Check if this error may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UploadFailure { transient: true, .. })
    }

    /// Check if this error aborts the pipeline
    ///
    /// Delete failures and malformed names are logged and skipped instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DeleteFailure { .. } | Self::MalformedRemoteName { .. }
        )
    }
}

fn failure_kind(transient: &bool) -> &'static str {
    if *transient {
        "transient"
    } else {
        "permanent"
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for drive-backup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::ConfigMissing("backup_name");
        assert_eq!(err.to_string(), "Missing required setting: backup_name");
    }

    #[test]
    fn test_upload_failure_display() {
        let err = BackupError::upload_transient("503 Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Upload failed (transient): 503 Service Unavailable"
        );
        assert!(err.is_transient());

        let err = BackupError::upload_permanent("400 Bad Request");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_fatal_classification() {
        let delete = BackupError::DeleteFailure {
            remote_id: "abc".into(),
            message: "gone".into(),
        };
        assert!(!delete.is_fatal());
        assert!(BackupError::ListFailure("timeout".into()).is_fatal());
        assert!(BackupError::AuthFailure("no token".into()).is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BackupError = io_err.into();
        assert!(matches!(err, BackupError::Io(_)));
    }
}
