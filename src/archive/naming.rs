//! Archive naming convention
//!
//! Every archive is named `{backup}_{YYYYMMDD}_{HHMMSS}.{ext}` with the
//! timestamp in UTC at second resolution. Parsing is anchored at both ends
//! and matches the backup name exactly, so archives of `foo` are never
//! mistaken for archives of `foobar` (or the other way round).

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use regex::Regex;
use thiserror::Error;

use crate::error::{BackupError, BackupResult};

/// `strftime` layout of the timestamp segment
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension of archives produced by this tool
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// MIME type the archives are uploaded with and listed by
pub const ARCHIVE_MIME_TYPE: &str = "application/gzip";

const MAX_BACKUP_NAME_LEN: usize = 100;

/// Why a name could not be parsed back into an [`ArchiveName`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name does not have the `{backup}_{8 digits}_{6 digits}.{ext}` shape
    #[error("does not match {backup}_YYYYMMDD_HHMMSS.<ext>")]
    PatternMismatch { backup: String },

    /// The digits are there but do not form a calendar date-time
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// A parsed or freshly generated archive file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    backup_name: String,
    created_at: DateTime<Utc>,
    extension: String,
}

impl ArchiveName {
    /// Name an archive of `backup_name` created at `created_at`
    ///
    /// Sub-second precision is dropped: two archives created within the same
    /// second get the same name.
    pub fn new(backup_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self::with_extension(backup_name, created_at, ARCHIVE_EXTENSION)
    }

    /// Like [`ArchiveName::new`] with a non-default extension
    pub fn with_extension(
        backup_name: impl Into<String>,
        created_at: DateTime<Utc>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            backup_name: backup_name.into(),
            created_at: created_at.trunc_subsecs(0),
            extension: extension.into(),
        }
    }

    pub fn backup_name(&self) -> &str {
        &self.backup_name
    }

    /// Creation time, UTC, whole seconds
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The `YYYYMMDD_HHMMSS` segment
    pub fn timestamp_segment(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}.{}",
            self.backup_name,
            self.timestamp_segment(),
            self.extension
        )
    }
}

/// Compiled matcher for the archives of one backup name
#[derive(Debug, Clone)]
pub struct NamePattern {
    backup_name: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile the anchored pattern for `backup_name`
    pub fn new(backup_name: &str) -> BackupResult<Self> {
        // `[0-9]` rather than `\d`: the latter also matches non-ASCII digits
        let pattern = format!(
            r"^{}_([0-9]{{8}}_[0-9]{{6}})\.([A-Za-z0-9]+(?:\.[A-Za-z0-9]+)*)$",
            regex::escape(backup_name)
        );
        let regex = Regex::new(&pattern).map_err(|e| {
            BackupError::Config(format!("Invalid backup name pattern: {}", e))
        })?;
        Ok(Self {
            backup_name: backup_name.to_string(),
            regex,
        })
    }

    pub fn backup_name(&self) -> &str {
        &self.backup_name
    }

    /// Parse a remote or local file name
    pub fn parse(&self, name: &str) -> Result<ArchiveName, NameError> {
        let captures = self
            .regex
            .captures(name)
            .ok_or_else(|| NameError::PatternMismatch {
                backup: self.backup_name.clone(),
            })?;

        let stamp = &captures[1];
        let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .map_err(|_| NameError::InvalidTimestamp(stamp.to_string()))?;

        Ok(ArchiveName {
            backup_name: self.backup_name.clone(),
            created_at: naive.and_utc(),
            extension: captures[2].to_string(),
        })
    }
}

/// Check that a backup name is safe to embed in archive names and queries
///
/// Allowed: ASCII letters and digits, `-`, `_` and `.`, up to 100 characters.
/// A name may not itself end in a `_YYYYMMDD_HHMMSS` segment.
pub fn validate_backup_name(name: &str) -> BackupResult<()> {
    if name.is_empty() {
        return Err(BackupError::Config("backup name must not be empty".into()));
    }

    if name.len() > MAX_BACKUP_NAME_LEN {
        return Err(BackupError::Config(format!(
            "backup name is longer than {} characters",
            MAX_BACKUP_NAME_LEN
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(BackupError::Config(format!(
            "backup name '{}' contains unsupported character {:?}",
            name, bad
        )));
    }

    if ends_with_timestamp(name) {
        return Err(BackupError::Config(format!(
            "backup name '{}' ends with a timestamp segment",
            name
        )));
    }

    Ok(())
}

/// `_` + 8 digits + `_` + 6 digits at the end of `name`
fn ends_with_timestamp(name: &str) -> bool {
    let bytes = name.as_bytes();
    let Some(tail) = bytes.len().checked_sub(16).map(|start| &bytes[start..]) else {
        return false;
    };
    tail.iter().enumerate().all(|(i, b)| match i {
        0 | 9 => *b == b'_',
        _ => b.is_ascii_digit(),
    })
}
