//! Authorization command
//!
//! Lets a user complete the interactive authorization ahead of the first
//! scheduled run, when a browser is at hand.

use super::authenticator;
use crate::auth::Authenticator;
use crate::config::BackupPaths;
use crate::error::BackupResult;

/// Handle the auth command
pub fn handle_auth_command(paths: &BackupPaths, force: bool) -> BackupResult<()> {
    let authenticator = authenticator(paths, true)?;

    let session = if force {
        authenticator.authorize_fresh()?
    } else {
        authenticator.authenticate()?
    };

    println!("Authorized.");
    println!("Session file: {}", paths.session_file().display());
    if let Some(expiry) = session.expiry {
        println!(
            "Access token valid until {}",
            expiry.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    if session.refresh_token.is_none() {
        println!("No refresh token was issued; run 'drive-backup auth --force' to re-consent.");
    }

    Ok(())
}
