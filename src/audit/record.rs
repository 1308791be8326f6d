//! Run history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backup::{PruneReport, RunReport};
use crate::error::BackupError;

/// Which command produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Backup,
    Prune,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    /// Upload succeeded, retention did not complete
    Partial,
    Failed,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunOutcome::Success => "SUCCESS",
            RunOutcome::Partial => "PARTIAL",
            RunOutcome::Failed => "FAILED",
        };
        f.pad(label)
    }
}

/// One line of `history.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,

    pub kind: RunKind,

    pub backup_name: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    pub outcome: RunOutcome,

    /// Archive file name, once one was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,

    #[serde(default)]
    pub deleted_count: usize,

    #[serde(default)]
    pub failed_delete_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    fn started(kind: RunKind, backup_name: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kind,
            backup_name: backup_name.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcome: RunOutcome::Success,
            archive: None,
            remote_id: None,
            deleted_count: 0,
            failed_delete_count: 0,
            error: None,
        }
    }

    /// Record for a backup run that got past the upload
    pub fn from_run(backup_name: &str, started_at: DateTime<Utc>, report: &RunReport) -> Self {
        Self {
            outcome: if report.is_partial() {
                RunOutcome::Partial
            } else {
                RunOutcome::Success
            },
            archive: Some(report.archive_name.clone()),
            remote_id: Some(report.remote_id.to_string()),
            deleted_count: report.deleted().len(),
            failed_delete_count: report.failed_deletes().len(),
            error: report.retention_error.clone(),
            ..Self::started(RunKind::Backup, backup_name, started_at)
        }
    }

    /// Record for an applied prune
    pub fn from_prune(backup_name: &str, started_at: DateTime<Utc>, report: &PruneReport) -> Self {
        Self {
            deleted_count: report.deleted.len(),
            failed_delete_count: report.failed_deletes.len(),
            ..Self::started(RunKind::Prune, backup_name, started_at)
        }
    }

    /// Record for a run that aborted
    pub fn failed(
        kind: RunKind,
        backup_name: &str,
        started_at: DateTime<Utc>,
        error: &BackupError,
    ) -> Self {
        Self {
            outcome: RunOutcome::Failed,
            error: Some(error.to_string()),
            ..Self::started(kind, backup_name, started_at)
        }
    }
}
