//! OAuth client secrets (`credentials.json`)
//!
//! Only needed for the first authorization; afterwards the session file
//! carries the client id and secret for refreshes.

use std::path::Path;

use serde::Deserialize;

use super::session::GOOGLE_TOKEN_URI;
use crate::error::{BackupError, BackupResult};

/// Google's OAuth consent endpoint
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Registered OAuth client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Layout of the file downloaded from the Google Cloud console
#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the console's JSON (`installed` or `web` client)
    pub fn from_json(json: &str) -> BackupResult<Self> {
        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| BackupError::AuthFailure(format!("Invalid client secrets: {}", e)))?;

        file.installed.or(file.web).ok_or_else(|| {
            BackupError::AuthFailure(
                "Client secrets contain neither an 'installed' nor a 'web' client".into(),
            )
        })
    }

    /// Read the secrets file
    pub fn load(path: &Path) -> BackupResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BackupError::AuthFailure(format!(
                "Cannot read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_installed_client() {
        let json = r#"{"installed": {
            "client_id": "123.apps.googleusercontent.com",
            "project_id": "backup",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "GOCSPX-abc",
            "redirect_uris": ["http://localhost"]
        }}"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "GOCSPX-abc");
    }

    #[test]
    fn test_web_client_with_default_uris() {
        let json = r#"{"web": {"client_id": "id", "client_secret": "s"}}"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.auth_uri, GOOGLE_AUTH_URI);
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_missing_client_section() {
        let err = ClientSecrets::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, BackupError::AuthFailure(_)));
    }

    #[test]
    fn test_missing_file_is_auth_failure() {
        let temp_dir = TempDir::new().unwrap();
        let err = ClientSecrets::load(&temp_dir.path().join("credentials.json")).unwrap_err();
        assert!(matches!(err, BackupError::AuthFailure(_)));
    }
}
