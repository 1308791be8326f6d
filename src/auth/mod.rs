//! Authorization against the remote store
//!
//! [`SessionAuthenticator`] turns the persisted session file into a usable
//! [`Session`]: reuse it while valid, refresh it when expired, and fall back
//! to a fresh interactive authorization when neither works. Unattended
//! runs (no terminal) never start the interactive flow on their own. The
//! OAuth exchanges themselves sit behind [`AuthProvider`].

pub mod oauth;
pub mod secrets;
pub mod session;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{BackupError, BackupResult};

pub use oauth::GoogleOAuth;
pub use secrets::ClientSecrets;
pub use session::{Session, DRIVE_SCOPE};

/// OAuth exchanges with the identity provider
pub trait AuthProvider {
    /// Run the interactive consent flow and return a new session
    fn authorize(&self, secrets: &ClientSecrets) -> BackupResult<Session>;

    /// Exchange the session's refresh token for a new access token
    fn refresh(&self, session: &Session) -> BackupResult<Session>;
}

/// Source of a valid session for a pipeline run
pub trait Authenticator {
    fn authenticate(&self) -> BackupResult<Session>;
}

/// Session file backed authenticator
pub struct SessionAuthenticator<P> {
    provider: P,
    session_file: PathBuf,
    secrets_file: PathBuf,
    interactive: bool,
}

impl<P: AuthProvider> SessionAuthenticator<P> {
    pub fn new(provider: P, session_file: PathBuf, secrets_file: PathBuf) -> Self {
        Self {
            provider,
            session_file,
            secrets_file,
            interactive: true,
        }
    }

    /// Whether `authenticate` may fall back to the consent flow
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Resolve a session valid at `now`, persisting any renewed one
    pub fn authenticate_at(&self, now: DateTime<Utc>) -> BackupResult<Session> {
        let stored = match Session::load(&self.session_file) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        };

        let stored = match stored {
            Some(session) if !session.has_scope(DRIVE_SCOPE) => {
                info!("Stored session lacks Drive access, authorizing again");
                None
            }
            other => other,
        };

        if let Some(session) = stored {
            if !session.is_expired(now) {
                debug!("Reusing stored session");
                return Ok(session);
            }

            if session.can_refresh() {
                match self.provider.refresh(&session) {
                    Ok(renewed) => {
                        info!("Access token refreshed");
                        renewed.save(&self.session_file)?;
                        return Ok(renewed);
                    }
                    Err(e) => warn!(error = %e, "Token refresh failed"),
                }
            }
        }

        if !self.interactive {
            return Err(BackupError::AuthFailure(
                "No usable session; run 'drive-backup auth' from a terminal to authorize".into(),
            ));
        }

        self.authorize_fresh()
    }

    /// Run the interactive flow regardless of the stored session
    pub fn authorize_fresh(&self) -> BackupResult<Session> {
        if !self.secrets_file.exists() {
            return Err(BackupError::AuthFailure(format!(
                "No usable session and no client secrets at {}",
                self.secrets_file.display()
            )));
        }

        let secrets = ClientSecrets::load(&self.secrets_file)?;
        let session = self.provider.authorize(&secrets)?;
        session.save(&self.session_file)?;
        info!(path = %self.session_file.display(), "Session saved");
        Ok(session)
    }
}

impl<P: AuthProvider> Authenticator for SessionAuthenticator<P> {
    fn authenticate(&self) -> BackupResult<Session> {
        self.authenticate_at(Utc::now())
    }
}
