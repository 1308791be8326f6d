//! Persisted authorization state
//!
//! The session file uses the same JSON layout as Google's "authorized user"
//! credentials (`token`, `refresh_token`, `client_id`, ... ), so a
//! `token.json` written by Google's own client libraries can be reused.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackupResult;
use crate::storage::{read_json_optional, write_json_atomic};

/// Full Drive access, needed to delete archives this tool did not create
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Google's OAuth token endpoint
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 60;

/// Access token plus everything needed to renew it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer access token
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// When the access token stops working (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.token
    }

    /// Whether the access token is expired (or about to be) at `now`
    ///
    /// A session without an expiry is assumed valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => self.token.is_empty(),
        }
    }

    /// Whether the session carries what a refresh needs
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
            && !self.client_id.is_empty()
    }

    /// Whether the session was granted `scope` (sessions without a scope
    /// list are trusted)
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|s| s == scope)
    }

    /// Load a session file, `None` if absent
    pub fn load(path: &Path) -> BackupResult<Option<Self>> {
        read_json_optional(path)
    }

    /// Persist atomically
    pub fn save(&self, path: &Path) -> BackupResult<()> {
        write_json_atomic(path, self)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_session() -> Session {
    Session {
        token: "test-access-token".into(),
        refresh_token: Some("test-refresh-token".into()),
        token_uri: GOOGLE_TOKEN_URI.into(),
        client_id: "client.apps.googleusercontent.com".into(),
        client_secret: "secret".into(),
        scopes: vec![DRIVE_SCOPE.into()],
        expiry: None,
    }
}
