//! Archive creation
//!
//! Walks a source directory and writes a gzip-compressed tar container into
//! the staging directory. The container is first written as
//! `<name>.partial` and only renamed to its final name once complete, so a
//! failed run never leaves a half-written archive under a real archive name.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::naming::ArchiveName;
use crate::error::{BackupError, BackupResult};

/// Result of a successful archive run
#[derive(Debug, Clone)]
pub struct ArchiveOutput {
    /// Final path of the archive
    pub path: PathBuf,
    /// Name (and so timestamp) of the archive
    pub name: ArchiveName,
    /// Number of files and symlinks stored
    pub entry_count: usize,
    /// Size of the compressed archive in bytes
    pub size_bytes: u64,
}

/// Builds archives into a staging directory
#[derive(Debug, Clone)]
pub struct Archiver {
    staging_dir: PathBuf,
}

impl Archiver {
    /// Create an Archiver writing into `staging_dir`
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// Get the staging directory
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Archive `source_dir` as `{backup_name}_{timestamp}.tar.gz`
    ///
    /// Regular files and symlinks are stored under their path relative to
    /// `source_dir`. Symlinks are stored as links and never followed.
    /// Directories only appear implicitly through the paths of their
    /// contents. Any unreadable entry aborts the whole archive.
    pub fn archive(
        &self,
        source_dir: &Path,
        backup_name: &str,
        now: DateTime<Utc>,
    ) -> BackupResult<ArchiveOutput> {
        let metadata = fs::metadata(source_dir).map_err(|e| {
            BackupError::SourceUnreadable(format!("{}: {}", source_dir.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(BackupError::SourceUnreadable(format!(
                "{} is not a directory",
                source_dir.display()
            )));
        }

        fs::create_dir_all(&self.staging_dir).map_err(|e| {
            BackupError::Archive(format!("Failed to create staging directory: {}", e))
        })?;

        let name = ArchiveName::new(backup_name, now);
        let final_path = self.staging_dir.join(name.to_string());
        if final_path.exists() {
            return Err(BackupError::Archive(format!(
                "{} already exists",
                final_path.display()
            )));
        }
        let partial_path = self.staging_dir.join(format!("{}.partial", name));

        info!(source = %source_dir.display(), archive = %name, "Creating archive");

        let entry_count = match write_archive(source_dir, &partial_path) {
            Ok(count) => count,
            Err(e) => {
                let _ = fs::remove_file(&partial_path);
                return Err(e);
            }
        };

        fs::rename(&partial_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&partial_path);
            BackupError::Archive(format!("Failed to finalize archive: {}", e))
        })?;

        let size_bytes = fs::metadata(&final_path)?.len();
        info!(entries = entry_count, bytes = size_bytes, "Archive created");

        Ok(ArchiveOutput {
            path: final_path,
            name,
            entry_count,
            size_bytes,
        })
    }
}

/// Write the tar.gz stream for `source_dir` to `dest`, returning the entry count
fn write_archive(source_dir: &Path, dest: &Path) -> BackupResult<usize> {
    let file = File::create(dest)
        .map_err(|e| BackupError::Archive(format!("Failed to create {}: {}", dest.display(), e)))?;

    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    let mut entry_count = 0;
    for entry in WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BackupError::SourceUnreadable(e.to_string()))?;
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() && !file_type.is_symlink() {
            warn!(path = %path.display(), "Skipping special file");
            continue;
        }

        let relative = path.strip_prefix(source_dir).map_err(|e| {
            BackupError::SourceUnreadable(format!("{}: {}", path.display(), e))
        })?;

        builder
            .append_path_with_name(path, relative)
            .map_err(|e| BackupError::SourceUnreadable(format!("{}: {}", path.display(), e)))?;
        debug!(path = %relative.display(), "Added");
        entry_count += 1;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| BackupError::Archive(format!("Failed to finish tar stream: {}", e)))?;
    let mut writer = encoder
        .finish()
        .map_err(|e| BackupError::Archive(format!("Failed to finish compression: {}", e)))?;
    writer
        .flush()
        .map_err(|e| BackupError::Archive(format!("Failed to flush archive: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| BackupError::Archive(format!("Failed to sync archive: {}", e)))?;

    Ok(entry_count)
}
