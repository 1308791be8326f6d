//! Backup pipeline
//!
//! One linear pass per invocation:
//! authenticate → archive → upload → list → select → delete → remove local.
//!
//! Any failure up to and including the upload aborts the run and keeps the
//! local archive (if one was built). Once the upload has succeeded, a failed
//! listing only cancels retention: the run is reported as a partial success
//! and the local archive is kept. Individual delete failures are logged and
//! left for the next run.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::archive::Archiver;
use crate::auth::{Authenticator, Session};
use crate::config::RemoteTarget;
use crate::error::BackupResult;
use crate::remote::{RemoteId, RemoteStore};
use crate::retention::{self, RetentionDecision, RetentionPolicy};

use super::report::{FailedDelete, PruneReport, RunReport};

/// Runs backups and retention against one remote target
pub struct BackupPipeline<A, S> {
    authenticator: A,
    store: S,
    target: RemoteTarget,
}

impl<A: Authenticator, S: RemoteStore> BackupPipeline<A, S> {
    pub fn new(authenticator: A, store: S, target: RemoteTarget) -> Self {
        Self {
            authenticator,
            store,
            target,
        }
    }

    /// Archive `source_dir`, upload it and prune expired archives
    pub fn run(
        &self,
        source_dir: &Path,
        archiver: &Archiver,
        now: DateTime<Utc>,
    ) -> BackupResult<RunReport> {
        let session = self.authenticator.authenticate()?;

        let output = archiver.archive(source_dir, &self.target.backup_name, now)?;

        let remote_id =
            match self
                .store
                .upload(&session, &output.path, &self.target.destination_folder_id)
            {
                Ok(id) => id,
                Err(e) => {
                    warn!(path = %output.path.display(), "Upload failed, local archive kept");
                    return Err(e);
                }
            };
        info!(name = %output.name, remote_id = %remote_id, "Archive uploaded");

        let mut report = RunReport {
            archive_name: output.name.to_string(),
            archive_bytes: output.size_bytes,
            entry_count: output.entry_count,
            remote_id,
            prune: None,
            retention_error: None,
            local_archive: Some(output.path.clone()),
        };

        match self.retain(&session, now, Some(&report.remote_id), true) {
            Ok(prune) => report.prune = Some(prune),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %output.path.display(),
                    "Retention skipped after successful upload, local archive kept"
                );
                report.retention_error = Some(e.to_string());
                return Ok(report);
            }
        }

        match fs::remove_file(&output.path) {
            Ok(()) => {
                debug!(path = %output.path.display(), "Local archive removed");
                report.local_archive = None;
            }
            Err(e) => warn!(
                error = %e,
                path = %output.path.display(),
                "Could not remove local archive"
            ),
        }

        Ok(report)
    }

    /// Apply (or with `apply == false`, only plan) retention
    pub fn prune(&self, now: DateTime<Utc>, apply: bool) -> BackupResult<PruneReport> {
        let session = self.authenticator.authenticate()?;
        self.retain(&session, now, None, apply)
    }

    fn retain(
        &self,
        session: &Session,
        now: DateTime<Utc>,
        protect: Option<&RemoteId>,
        apply: bool,
    ) -> BackupResult<PruneReport> {
        let entries = self.store.list(
            session,
            &self.target.destination_folder_id,
            &self.target.backup_name,
        )?;
        let plan = retention::plan(
            &entries,
            &self.target.backup_name,
            RetentionPolicy::new(self.target.retention_days),
            now,
        )?;
        debug!(
            listed = entries.len(),
            cutoff = %plan.cutoff,
            "Retention plan ready"
        );

        let mut deleted = Vec::new();
        let mut failed_deletes = Vec::new();

        if apply {
            let expired = plan
                .entries
                .iter()
                .filter(|p| p.decision == RetentionDecision::Delete);

            for planned in expired {
                let id = &planned.entry.remote_id;
                if protect == Some(id) {
                    warn!(name = %planned.entry.name, "Not deleting the archive uploaded by this run");
                    continue;
                }

                match self.store.delete(session, id) {
                    Ok(()) => {
                        info!(name = %planned.entry.name, "Deleted expired archive");
                        deleted.push(id.clone());
                    }
                    Err(e) if e.is_fatal() => {
                        warn!(
                            error = %e,
                            deleted = deleted.len(),
                            "Retention aborted"
                        );
                        return Err(e);
                    }
                    Err(e) => {
                        warn!(error = %e, name = %planned.entry.name, "Delete failed, retrying next run");
                        failed_deletes.push(FailedDelete {
                            remote_id: id.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(PruneReport {
            plan,
            applied: apply,
            deleted,
            failed_deletes,
        })
    }
}
