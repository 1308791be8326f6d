//! drive-backup - Scheduled directory backup to Google Drive
//!
//! This library archives a local directory into a timestamped `.tar.gz`,
//! uploads it to a Google Drive folder and prunes archives older than a
//! retention window. It runs once per invocation; scheduling is left to
//! cron, systemd timers or similar.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `archive`: Archive naming contract and `.tar.gz` builder
//! - `retention`: Pure age-based selection of archives to delete
//! - `auth`: Session persistence and Google OAuth
//! - `remote`: Remote store trait and the Drive client
//! - `backup`: The pipeline tying the stages together
//! - `audit`: Run history
//! - `storage`: Atomic JSON file helpers
//! - `cli`, `display`: Command handlers and terminal output
//!
//! # Example
//!
//! ```rust,ignore
//! use drive_backup::config::{BackupConfig, BackupPaths, ConfigOverrides, Settings};
//!
//! let paths = BackupPaths::new()?;
//! let settings = Settings::load_or_default(&paths)?;
//! let config = BackupConfig::resolve(&settings, ConfigOverrides::default(), &paths)?;
//! ```

pub mod archive;
pub mod audit;
pub mod auth;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod remote;
pub mod retention;
pub mod storage;

pub use error::{BackupError, BackupResult};
