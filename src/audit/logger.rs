//! Append-only run history
//!
//! Each run is written as a single JSON line and flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{BackupError, BackupResult};

use super::record::RunRecord;

/// Reads and writes the run history file (JSONL)
pub struct HistoryLogger {
    log_path: PathBuf,
}

impl HistoryLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one record
    pub fn append(&self, record: &RunRecord) -> BackupResult<()> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BackupError::Io(format!("Failed to create history directory: {}", e))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open run history: {}", e)))?;

        let json = serde_json::to_string(record)
            .map_err(|e| BackupError::Json(format!("Failed to serialize run record: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| BackupError::Io(format!("Failed to write run record: {}", e)))?;

        file.flush()
            .map_err(|e| BackupError::Io(format!("Failed to flush run history: {}", e)))?;

        Ok(())
    }

    /// Read all records, oldest first
    ///
    /// Lines that do not parse (e.g. a torn final write) are skipped with a
    /// warning rather than hiding the rest of the history.
    pub fn read_all(&self) -> BackupResult<Vec<RunRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open run history: {}", e)))?;

        let mut records = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                BackupError::Io(format!(
                    "Failed to read run history line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = line_num + 1, error = %e, "Skipping unreadable history line"),
            }
        }

        Ok(records)
    }

    /// Read the most recent `count` records, oldest first
    pub fn read_recent(&self, count: usize) -> BackupResult<Vec<RunRecord>> {
        let mut records = self.read_all()?;
        let start = records.len().saturating_sub(count);
        Ok(records.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
