//! Remote archive storage
//!
//! The pipeline talks to remote storage only through the [`RemoteStore`]
//! trait. [`DriveClient`] implements it for Google Drive; tests use an
//! in-memory store.

pub mod drive;
pub mod query;
pub mod retry;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::error::BackupResult;

pub use drive::{DriveClient, DriveEndpoints};
pub use query::DriveQuery;
pub use retry::{RetryPolicy, TransportError};

/// Opaque identifier of a remote item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One item of a remote listing
///
/// `name` is whatever the remote reports; it may not be a well-formed
/// archive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchiveEntry {
    pub remote_id: RemoteId,
    pub name: String,
}

impl RemoteArchiveEntry {
    pub fn new(remote_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            remote_id: RemoteId::new(remote_id),
            name: name.into(),
        }
    }
}

/// Operations the backup pipeline needs from remote storage
pub trait RemoteStore {
    /// Upload `local_path` under its file name into `folder_id`
    fn upload(&self, session: &Session, local_path: &Path, folder_id: &str)
        -> BackupResult<RemoteId>;

    /// List every archive in `folder_id` whose name starts with `{backup_name}_`
    ///
    /// Must page through the complete listing.
    fn list(
        &self,
        session: &Session,
        folder_id: &str,
        backup_name: &str,
    ) -> BackupResult<Vec<RemoteArchiveEntry>>;

    /// Delete one item; deleting an item that is already gone succeeds
    fn delete(&self, session: &Session, remote_id: &RemoteId) -> BackupResult<()>;
}
