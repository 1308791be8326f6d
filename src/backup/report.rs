//! Outcome of pipeline runs

use std::path::PathBuf;

use crate::remote::RemoteId;
use crate::retention::RetentionPlan;

/// A remote delete that failed; the archive stays for the next run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelete {
    pub remote_id: RemoteId,
    pub message: String,
}

/// Result of the retention phase (list, select, delete)
#[derive(Debug, Clone)]
pub struct PruneReport {
    pub plan: RetentionPlan,
    /// False for a dry run: nothing was deleted
    pub applied: bool,
    pub deleted: Vec<RemoteId>,
    pub failed_deletes: Vec<FailedDelete>,
}

impl PruneReport {
    pub fn skipped_malformed(&self) -> Vec<String> {
        self.plan.skipped()
    }
}

/// Result of a full backup run that got past the upload
#[derive(Debug, Clone)]
pub struct RunReport {
    /// File name of the uploaded archive
    pub archive_name: String,
    pub archive_bytes: u64,
    pub entry_count: usize,
    pub remote_id: RemoteId,
    /// `None` when retention could not run
    pub prune: Option<PruneReport>,
    /// Why retention did not run, after a successful upload
    pub retention_error: Option<String>,
    /// Local archive still on disk, if it was kept
    pub local_archive: Option<PathBuf>,
}

impl RunReport {
    /// Upload succeeded but retention did not complete
    pub fn is_partial(&self) -> bool {
        self.retention_error.is_some()
    }

    pub fn deleted(&self) -> &[RemoteId] {
        match &self.prune {
            Some(prune) => &prune.deleted,
            None => &[],
        }
    }

    pub fn failed_deletes(&self) -> &[FailedDelete] {
        match &self.prune {
            Some(prune) => &prune.failed_deletes,
            None => &[],
        }
    }

    pub fn skipped_malformed(&self) -> Vec<String> {
        self.prune
            .as_ref()
            .map(PruneReport::skipped_malformed)
            .unwrap_or_default()
    }
}
