//! Archive creation and the archive naming contract
//!
//! - `naming`: formats and parses `{backup}_{YYYYMMDD}_{HHMMSS}.{ext}`
//! - `builder`: walks a source directory into a `.tar.gz` container

pub mod builder;
pub mod naming;

pub use builder::{ArchiveOutput, Archiver};
pub use naming::{
    validate_backup_name, ArchiveName, NameError, NamePattern, ARCHIVE_EXTENSION,
    ARCHIVE_MIME_TYPE,
};
