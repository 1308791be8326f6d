//! Google OAuth 2.0 for installed applications
//!
//! First authorization uses the loopback redirect flow: a one-shot listener
//! on `127.0.0.1` receives the authorization code after the user approves
//! access in a browser. The listener gives up after
//! [`AUTHORIZATION_TIMEOUT`]. Refreshes go straight to the token endpoint.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::secrets::ClientSecrets;
use super::session::{Session, DRIVE_SCOPE};
use super::AuthProvider;
use crate::error::{BackupError, BackupResult};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the loopback listener waits for the browser redirect
pub const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

const ACCEPT_POLL: Duration = Duration::from_millis(200);
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(10);

const CALLBACK_PAGE: &str = "<html><body><p>drive-backup is authorized. \
                             You can close this window.</p></body></html>";

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Error body of the token endpoint
#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// [`AuthProvider`] backed by Google's OAuth endpoints
pub struct GoogleOAuth {
    http: Client,
    callback_timeout: Duration,
}

impl GoogleOAuth {
    pub fn new() -> BackupResult<Self> {
        let http = Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .build()
            .map_err(|e| BackupError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            callback_timeout: AUTHORIZATION_TIMEOUT,
        })
    }

    /// Override how long `authorize` waits for the browser redirect
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    fn request_token(&self, token_uri: &str, form: &[(&str, &str)]) -> BackupResult<TokenResponse> {
        let response = self
            .http
            .post(token_uri)
            .form(form)
            .send()
            .map_err(|e| BackupError::AuthFailure(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| BackupError::AuthFailure(format!("Token response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenError>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status),
            };
            return Err(BackupError::AuthFailure(detail));
        }

        serde_json::from_str(&body)
            .map_err(|e| BackupError::AuthFailure(format!("Invalid token response: {}", e)))
    }
}

impl AuthProvider for GoogleOAuth {
    fn authorize(&self, secrets: &ClientSecrets) -> BackupResult<Session> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|e| {
            BackupError::AuthFailure(format!("Cannot open local callback listener: {}", e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| BackupError::AuthFailure(e.to_string()))?
            .port();
        let redirect_uri = format!("http://localhost:{}/", port);
        let state = Uuid::new_v4().simple().to_string();

        let url = authorization_url(secrets, &redirect_uri, &state)?;
        println!("Open this URL in a browser to authorize drive-backup:");
        println!();
        println!("  {}", url);
        println!();
        println!("Waiting for authorization on {} ...", redirect_uri);

        let code = wait_for_code(&listener, &state, self.callback_timeout)?;
        debug!("Authorization code received");

        let token = self.request_token(
            &secrets.token_uri,
            &[
                ("code", code.as_str()),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )?;
        if token.refresh_token.is_none() {
            warn!("No refresh token granted; the next run will need to authorize again");
        }

        info!("Authorization complete");
        Ok(session_from_token(token, secrets, None, Utc::now()))
    }

    fn refresh(&self, session: &Session) -> BackupResult<Session> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or_else(|| BackupError::AuthFailure("Session has no refresh token".into()))?;

        let token = self.request_token(
            &session.token_uri,
            &[
                ("client_id", session.client_id.as_str()),
                ("client_secret", session.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
        )?;

        let client = ClientSecrets {
            client_id: session.client_id.clone(),
            client_secret: session.client_secret.clone(),
            auth_uri: String::new(),
            token_uri: session.token_uri.clone(),
        };
        Ok(session_from_token(token, &client, Some(session), Utc::now()))
    }
}

/// Consent page URL for the loopback flow
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    state: &str,
) -> BackupResult<Url> {
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", DRIVE_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| BackupError::AuthFailure(format!("Invalid auth_uri: {}", e)))
}

/// Build a session from a token response
///
/// Values the endpoint leaves out (a refresh omits the refresh token and
/// sometimes the scope) are carried over from `previous`.
fn session_from_token(
    token: TokenResponse,
    client: &ClientSecrets,
    previous: Option<&Session>,
    now: DateTime<Utc>,
) -> Session {
    let scopes = match token.scope {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => previous
            .map(|s| s.scopes.clone())
            .unwrap_or_else(|| vec![DRIVE_SCOPE.to_string()]),
    };

    Session {
        token: token.access_token,
        refresh_token: token
            .refresh_token
            .or_else(|| previous.and_then(|s| s.refresh_token.clone())),
        token_uri: client.token_uri.clone(),
        client_id: client.client_id.clone(),
        client_secret: client.client_secret.clone(),
        scopes,
        expiry: token
            .expires_in
            .map(|secs| now + chrono::Duration::seconds(secs)),
    }
}

/// Accept callback requests until one carries a code or an error
///
/// Fails once `timeout` passes without a usable callback.
fn wait_for_code(listener: &TcpListener, state: &str, timeout: Duration) -> BackupResult<String> {
    listener
        .set_nonblocking(true)
        .map_err(|e| BackupError::AuthFailure(format!("Callback listener failed: {}", e)))?;
    let deadline = Instant::now() + timeout;

    loop {
        let mut stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(BackupError::AuthFailure(format!(
                        "No authorization received within {} seconds",
                        timeout.as_secs()
                    )));
                }
                thread::sleep(ACCEPT_POLL);
                continue;
            }
            Err(e) => {
                return Err(BackupError::AuthFailure(format!(
                    "Callback listener failed: {}",
                    e
                )))
            }
        };
        stream
            .set_nonblocking(false)
            .and_then(|()| stream.set_read_timeout(Some(CALLBACK_READ_TIMEOUT)))
            .map_err(|e| BackupError::AuthFailure(format!("Bad callback connection: {}", e)))?;

        let request_line = read_request_head(&stream)?;
        let target = request_line.split_whitespace().nth(1).unwrap_or("/");

        let outcome = parse_callback(target, state);
        let (status, body) = match &outcome {
            Ok(Some(_)) => ("200 OK", CALLBACK_PAGE),
            Ok(None) => ("404 Not Found", ""),
            Err(_) => ("400 Bad Request", "Authorization failed."),
        };
        let _ = write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        if let Some(code) = outcome? {
            return Ok(code);
        }
    }
}

/// Read the request line, draining the headers so closing the socket does
/// not reset the reply
fn read_request_head(stream: &TcpStream) -> BackupResult<String> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .map_err(|e| BackupError::AuthFailure(format!("Bad callback request: {}", e)))?;

    let mut header = String::new();
    while reader.read_line(&mut header).is_ok_and(|n| n > 2) {
        header.clear();
    }
    Ok(request_line)
}

/// Extract the authorization code from a callback request target
///
/// `Ok(None)` means the request is unrelated (e.g. a favicon fetch).
fn parse_callback(target: &str, expected_state: &str) -> BackupResult<Option<String>> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .map_err(|e| BackupError::AuthFailure(format!("Bad callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(BackupError::AuthFailure(format!(
            "Authorization denied: {}",
            error
        )));
    }

    match code {
        None => Ok(None),
        Some(_) if state.as_deref() != Some(expected_state) => Err(BackupError::AuthFailure(
            "Callback state does not match this authorization request".into(),
        )),
        Some(code) => Ok(Some(code)),
    }
}
