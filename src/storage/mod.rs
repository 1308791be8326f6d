//! Local state storage for drive-backup
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. Used for the settings file and the persisted session.

pub mod file_io;

pub use file_io::{read_json_optional, write_json_atomic};
