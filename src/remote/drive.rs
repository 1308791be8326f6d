//! Google Drive v3 implementation of [`RemoteStore`]
//!
//! Uploads use Drive's resumable protocol: one request opens an upload
//! session, then the file is sent in chunks with `Content-Range`. A retried
//! chunk first asks the session how many bytes it already holds, so an
//! interrupted chunk resumes instead of restarting the whole file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_RANGE, LOCATION, RANGE};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use super::query::DriveQuery;
use super::retry::{RetryPolicy, TransportError};
use super::{RemoteArchiveEntry, RemoteId, RemoteStore};
use crate::archive::ARCHIVE_MIME_TYPE;
use crate::auth::Session;
use crate::error::{BackupError, BackupResult};

/// Drive REST endpoint
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive media upload endpoint
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const PAGE_SIZE: &str = "100";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Base URLs of the Drive API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEndpoints {
    pub api_base: String,
    pub upload_base: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        }
    }
}

/// Blocking Drive client
pub struct DriveClient {
    http: Client,
    endpoints: DriveEndpoints,
    retry: RetryPolicy,
    chunk_size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

/// State of a resumable upload after a request
#[derive(Debug, PartialEq, Eq)]
enum ChunkOutcome {
    Incomplete { next_offset: u64 },
    Complete(RemoteId),
}

impl DriveClient {
    /// Create a client against the public Drive endpoints
    pub fn new(retry: RetryPolicy, chunk_size: usize) -> BackupResult<Self> {
        Self::with_endpoints(DriveEndpoints::default(), retry, chunk_size)
    }

    /// Create a client against custom endpoints
    pub fn with_endpoints(
        endpoints: DriveEndpoints,
        retry: RetryPolicy,
        chunk_size: usize,
    ) -> BackupResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            // Drive answers incomplete uploads with 308 and no Location
            .redirect(Policy::none())
            .user_agent(concat!("drive-backup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackupError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoints,
            retry,
            chunk_size: chunk_size.max(1),
        })
    }

    fn start_upload(
        &self,
        session: &Session,
        name: &str,
        folder_id: &str,
        total: u64,
    ) -> Result<String, TransportError> {
        let request = self
            .http
            .post(format!("{}/files", self.endpoints.upload_base))
            .query(&[
                ("uploadType", "resumable"),
                ("fields", "id"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(session.access_token())
            .header("X-Upload-Content-Type", ARCHIVE_MIME_TYPE)
            .header("X-Upload-Content-Length", total.to_string())
            .json(&json!({
                "name": name,
                "parents": [folder_id],
                "mimeType": ARCHIVE_MIME_TYPE,
            }));

        let response = send(request)?;
        if !response.status().is_success() {
            return Err(error_for_status(response));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TransportError::permanent("Upload session response has no Location"))
    }

    fn put_chunk(
        &self,
        session: &Session,
        upload_url: &str,
        file: &mut File,
        offset: u64,
        total: u64,
    ) -> Result<ChunkOutcome, TransportError> {
        let len = total.saturating_sub(offset).min(self.chunk_size as u64);
        let mut chunk = vec![0u8; len as usize];
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut chunk))
            .map_err(|e| TransportError::permanent(format!("Failed to read archive: {}", e)))?;

        let content_range = if len == 0 {
            format!("bytes */{}", total)
        } else {
            format!("bytes {}-{}/{}", offset, offset + len - 1, total)
        };

        let request = self
            .http
            .put(upload_url)
            .bearer_auth(session.access_token())
            .header(CONTENT_RANGE, content_range)
            .body(chunk);

        upload_outcome(send(request)?)
    }

    fn query_upload_status(
        &self,
        session: &Session,
        upload_url: &str,
        total: u64,
    ) -> Result<ChunkOutcome, TransportError> {
        let request = self
            .http
            .put(upload_url)
            .bearer_auth(session.access_token())
            .header(CONTENT_RANGE, format!("bytes */{}", total))
            .body(Vec::new());

        upload_outcome(send(request)?)
    }

    fn list_page(
        &self,
        session: &Session,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FileList, TransportError> {
        let mut params = vec![
            ("q", query),
            ("fields", "nextPageToken,files(id,name)"),
            ("pageSize", PAGE_SIZE),
            ("spaces", "drive"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let request = self
            .http
            .get(format!("{}/files", self.endpoints.api_base))
            .bearer_auth(session.access_token())
            .query(&params);

        let response = send(request)?;
        if !response.status().is_success() {
            return Err(error_for_status(response));
        }

        response
            .json()
            .map_err(|e| TransportError::permanent(format!("Invalid listing response: {}", e)))
    }

    fn file_url(&self, remote_id: &RemoteId) -> BackupResult<Url> {
        let mut url = Url::parse(&format!("{}/files", self.endpoints.api_base))
            .map_err(|e| BackupError::Config(format!("Invalid Drive API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BackupError::Config("Drive API URL cannot take a path".into()))?
            .push(remote_id.as_str());
        Ok(url)
    }
}

impl RemoteStore for DriveClient {
    fn upload(
        &self,
        session: &Session,
        local_path: &Path,
        folder_id: &str,
    ) -> BackupResult<RemoteId> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                BackupError::upload_permanent(format!(
                    "{} has no UTF-8 file name",
                    local_path.display()
                ))
            })?;

        let mut file = File::open(local_path).map_err(|e| {
            BackupError::upload_permanent(format!("Failed to open {}: {}", local_path.display(), e))
        })?;
        let total = file
            .metadata()
            .map_err(|e| BackupError::upload_permanent(format!("Failed to stat archive: {}", e)))?
            .len();

        info!(file = name, bytes = total, folder = folder_id, "Uploading");

        let upload_url = self
            .retry
            .run("start upload", |_| {
                self.start_upload(session, name, folder_id, total)
            })
            .map_err(upload_error)?;

        let mut offset = 0u64;
        let mut stalled = 0u32;
        loop {
            let outcome = self
                .retry
                .run("upload chunk", |attempt| {
                    if attempt > 1 {
                        match self.query_upload_status(session, &upload_url, total)? {
                            ChunkOutcome::Incomplete { next_offset } => offset = next_offset,
                            done => return Ok(done),
                        }
                    }
                    self.put_chunk(session, &upload_url, &mut file, offset, total)
                })
                .map_err(upload_error)?;

            match outcome {
                ChunkOutcome::Complete(id) => {
                    info!(file = name, remote_id = %id, "Upload complete");
                    return Ok(id);
                }
                ChunkOutcome::Incomplete { next_offset } => {
                    if next_offset > total {
                        return Err(BackupError::upload_permanent(format!(
                            "Server reports {} of {} bytes received",
                            next_offset, total
                        )));
                    }
                    if next_offset <= offset {
                        stalled += 1;
                        if stalled >= self.retry.max_attempts() {
                            return Err(BackupError::upload_transient(format!(
                                "Upload stalled at byte {}",
                                offset
                            )));
                        }
                    } else {
                        stalled = 0;
                    }
                    offset = next_offset;
                    debug!(offset, total, "Chunk accepted");
                }
            }
        }
    }

    fn list(
        &self,
        session: &Session,
        folder_id: &str,
        backup_name: &str,
    ) -> BackupResult<Vec<RemoteArchiveEntry>> {
        let prefix = format!("{}_", backup_name);
        let query = DriveQuery::new()
            .in_parent(folder_id)
            .name_contains(prefix.as_str())
            .mime_type(ARCHIVE_MIME_TYPE)
            .not_trashed()
            .to_string();

        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;
        loop {
            let page = self
                .retry
                .run("list archives", |_| {
                    self.list_page(session, &query, page_token.as_deref())
                })
                .map_err(|e| BackupError::ListFailure(e.message))?;
            pages += 1;

            // `name contains` matches word prefixes; keep only true prefixes
            entries.extend(
                page.files
                    .into_iter()
                    .filter(|file| file.name.starts_with(&prefix))
                    .map(|file| RemoteArchiveEntry::new(file.id, file.name)),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(pages, count = entries.len(), "Listed remote archives");
        Ok(entries)
    }

    fn delete(&self, session: &Session, remote_id: &RemoteId) -> BackupResult<()> {
        let url = self.file_url(remote_id)?;

        self.retry
            .run("delete archive", |_| {
                let request = self
                    .http
                    .delete(url.clone())
                    .bearer_auth(session.access_token())
                    .query(&[("supportsAllDrives", "true")]);

                let response = send(request)?;
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else if status == StatusCode::NOT_FOUND {
                    debug!(remote_id = %remote_id, "Already deleted");
                    Ok(())
                } else {
                    Err(error_for_status(response))
                }
            })
            .map_err(|e| BackupError::DeleteFailure {
                remote_id: remote_id.to_string(),
                message: e.message,
            })
    }
}

fn send(request: RequestBuilder) -> Result<Response, TransportError> {
    request.send().map_err(|e| {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            TransportError::transient(e.to_string())
        } else {
            TransportError::permanent(e.to_string())
        }
    })
}

fn upload_outcome(response: Response) -> Result<ChunkOutcome, TransportError> {
    let status = response.status();

    if status == StatusCode::PERMANENT_REDIRECT {
        let next_offset = response
            .headers()
            .get(RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(range_end)
            .map_or(0, |end| end + 1);
        return Ok(ChunkOutcome::Incomplete { next_offset });
    }

    if status.is_success() {
        let created: CreatedFile = response
            .json()
            .map_err(|e| TransportError::permanent(format!("Invalid upload response: {}", e)))?;
        return Ok(ChunkOutcome::Complete(RemoteId::new(created.id)));
    }

    Err(error_for_status(response))
}

/// Last byte index of a `Range: bytes=0-N` header
fn range_end(header: &str) -> Option<u64> {
    header
        .strip_prefix("bytes=")?
        .split_once('-')?
        .1
        .trim()
        .parse()
        .ok()
}

fn error_for_status(response: Response) -> TransportError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body).ok();

    let transient = match status.as_u16() {
        408 | 429 | 500..=599 => true,
        403 => parsed.as_ref().map_or(false, |b| {
            b.error
                .errors
                .iter()
                .any(|e| matches!(e.reason.as_str(), "rateLimitExceeded" | "userRateLimitExceeded"))
        }),
        _ => false,
    };

    let detail = match parsed {
        Some(b) if !b.error.message.is_empty() => b.error.message,
        _ => body.chars().take(200).collect(),
    };

    TransportError {
        message: format!("HTTP {}: {}", status, detail),
        transient,
    }
}

fn upload_error(err: TransportError) -> BackupError {
    BackupError::UploadFailure {
        message: err.message,
        transient: err.transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::test_session;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread::{self, JoinHandle};
    use tempfile::TempDir;

    struct Canned {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    }

    fn reply(status: u16, body: &str) -> Canned {
        Canned {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn reply_with(status: u16, header: &'static str, value: &str, body: &str) -> Canned {
        Canned {
            status,
            headers: vec![(header, value.to_string())],
            body: body.to_string(),
        }
    }

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        target: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    }

    impl Recorded {
        fn path(&self) -> &str {
            self.target.split('?').next().unwrap()
        }

        fn query(&self) -> HashMap<String, String> {
            let query = self.target.split_once('?').map_or("", |(_, q)| q);
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).map(String::as_str)
        }
    }

    /// Minimal HTTP/1.1 server answering one canned response per connection
    struct TestServer {
        listener: TcpListener,
        base: String,
    }

    impl TestServer {
        fn bind() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            Self { listener, base }
        }

        fn endpoints(&self) -> DriveEndpoints {
            DriveEndpoints {
                api_base: format!("{}/drive/v3", self.base),
                upload_base: format!("{}/upload/drive/v3", self.base),
            }
        }

        fn serve(self, responses: Vec<Canned>) -> (Arc<Mutex<Vec<Recorded>>>, JoinHandle<()>) {
            let recorded = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&recorded);
            let handle = thread::spawn(move || {
                for canned in responses {
                    let (mut stream, _) = self.listener.accept().unwrap();
                    let mut reader = BufReader::new(stream.try_clone().unwrap());

                    let mut request_line = String::new();
                    reader.read_line(&mut request_line).unwrap();
                    let mut parts = request_line.split_whitespace();
                    let method = parts.next().unwrap().to_string();
                    let target = parts.next().unwrap().to_string();

                    let mut headers = HashMap::new();
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).unwrap();
                        let line = line.trim_end();
                        if line.is_empty() {
                            break;
                        }
                        let (name, value) = line.split_once(':').unwrap();
                        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                    }
                    let len = headers
                        .get("content-length")
                        .map_or(0, |v| v.parse::<usize>().unwrap());
                    let mut body = vec![0; len];
                    reader.read_exact(&mut body).unwrap();

                    sink.lock().unwrap().push(Recorded {
                        method,
                        target,
                        headers,
                        body,
                    });

                    let mut response = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Length: {}\r\nConnection: close\r\n",
                        canned.status,
                        canned.body.len()
                    );
                    for (name, value) in &canned.headers {
                        response.push_str(&format!("{}: {}\r\n", name, value));
                    }
                    response.push_str("\r\n");
                    response.push_str(&canned.body);
                    stream.write_all(response.as_bytes()).unwrap();
                }
            });
            (recorded, handle)
        }
    }

    fn client(server: &TestServer, attempts: u32, chunk_size: usize) -> DriveClient {
        DriveClient::with_endpoints(
            server.endpoints(),
            RetryPolicy::new(attempts, Duration::ZERO),
            chunk_size,
        )
        .unwrap()
    }

    #[test]
    fn test_list_pages_through_all_results() {
        let server = TestServer::bind();
        let drive = client(&server, 1, 1024);
        let (recorded, handle) = server.serve(vec![
            reply(
                200,
                r#"{"nextPageToken": "page-2", "files": [
                    {"id": "1", "name": "nightly_20240101_020000.tar.gz"},
                    {"id": "2", "name": "nightly-old_20240101_020000.tar.gz"}
                ]}"#,
            ),
            reply(
                200,
                r#"{"files": [{"id": "3", "name": "nightly_bad.tar.gz"}]}"#,
            ),
        ]);

        let entries = drive
            .list(&test_session(), "folder123", "nightly")
            .unwrap();
        handle.join().unwrap();

        assert_eq!(
            entries,
            vec![
                RemoteArchiveEntry::new("1", "nightly_20240101_020000.tar.gz"),
                RemoteArchiveEntry::new("3", "nightly_bad.tar.gz"),
            ]
        );

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path(), "/drive/v3/files");
        assert_eq!(
            requests[0].query()["q"],
            "'folder123' in parents and name contains 'nightly_' and \
             mimeType = 'application/gzip' and trashed = false"
        );
        assert!(!requests[0].query().contains_key("pageToken"));
        assert_eq!(requests[1].query()["pageToken"], "page-2");
        assert_eq!(
            requests[0].header("authorization"),
            Some("Bearer test-access-token")
        );
    }

    #[test]
    fn test_list_failure_after_retries() {
        let server = TestServer::bind();
        let drive = client(&server, 2, 1024);
        let (recorded, handle) = server.serve(vec![
            reply(503, "unavailable"),
            reply(503, "unavailable"),
        ]);

        let err = drive
            .list(&test_session(), "folder123", "nightly")
            .unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, BackupError::ListFailure(_)));
        assert_eq!(recorded.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_treats_missing_as_success() {
        let server = TestServer::bind();
        let drive = client(&server, 1, 1024);
        let (recorded, handle) = server.serve(vec![
            reply(204, ""),
            reply(404, r#"{"error": {"message": "File not found"}}"#),
        ]);

        drive
            .delete(&test_session(), &RemoteId::new("abc"))
            .unwrap();
        drive
            .delete(&test_session(), &RemoteId::new("abc"))
            .unwrap();
        handle.join().unwrap();

        let requests = recorded.lock().unwrap();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].path(), "/drive/v3/files/abc");
    }

    #[test]
    fn test_delete_forbidden_is_delete_failure() {
        let server = TestServer::bind();
        let drive = client(&server, 3, 1024);
        let (recorded, handle) = server.serve(vec![reply(
            403,
            r#"{"error": {"message": "Insufficient permissions",
                "errors": [{"reason": "insufficientFilePermissions"}]}}"#,
        )]);

        let err = drive
            .delete(&test_session(), &RemoteId::new("abc"))
            .unwrap_err();
        handle.join().unwrap();

        match err {
            BackupError::DeleteFailure { remote_id, message } => {
                assert_eq!(remote_id, "abc");
                assert!(message.contains("Insufficient permissions"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_resumable_upload_in_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nightly_20240201_000000.tar.gz");
        std::fs::write(&path, b"0123456789").unwrap();

        let server = TestServer::bind();
        let session_url = format!("{}/upload-session/xyz", server.base);
        let drive = client(&server, 1, 4);
        let (recorded, handle) = server.serve(vec![
            reply_with(200, "Location", &session_url, ""),
            reply_with(308, "Range", "bytes=0-3", ""),
            reply_with(308, "Range", "bytes=0-7", ""),
            reply(200, r#"{"id": "new-file-id"}"#),
        ]);

        let id = drive
            .upload(&test_session(), &path, "folder123")
            .unwrap();
        handle.join().unwrap();

        assert_eq!(id, RemoteId::new("new-file-id"));

        let requests = recorded.lock().unwrap();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path(), "/upload/drive/v3/files");
        assert_eq!(requests[0].query()["uploadType"], "resumable");
        assert_eq!(requests[0].header("x-upload-content-length"), Some("10"));
        let metadata: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(metadata["name"], "nightly_20240201_000000.tar.gz");
        assert_eq!(metadata["parents"][0], "folder123");

        assert_eq!(requests[1].path(), "/upload-session/xyz");
        assert_eq!(requests[1].header("content-range"), Some("bytes 0-3/10"));
        assert_eq!(requests[1].body, b"0123");
        assert_eq!(requests[2].header("content-range"), Some("bytes 4-7/10"));
        assert_eq!(requests[3].header("content-range"), Some("bytes 8-9/10"));
        assert_eq!(requests[3].body, b"89");
    }

    #[test]
    fn test_interrupted_chunk_resumes_from_server_offset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nightly_20240201_000000.tar.gz");
        std::fs::write(&path, b"0123456789").unwrap();

        let server = TestServer::bind();
        let session_url = format!("{}/upload-session/xyz", server.base);
        let drive = client(&server, 3, 10);
        let (recorded, handle) = server.serve(vec![
            reply_with(200, "Location", &session_url, ""),
            reply(503, "backend error"),
            reply_with(308, "Range", "bytes=0-3", ""),
            reply(201, r#"{"id": "resumed"}"#),
        ]);

        let id = drive
            .upload(&test_session(), &path, "folder123")
            .unwrap();
        handle.join().unwrap();

        assert_eq!(id, RemoteId::new("resumed"));
        let requests = recorded.lock().unwrap();
        assert_eq!(requests[1].header("content-range"), Some("bytes 0-9/10"));
        assert_eq!(requests[2].header("content-range"), Some("bytes */10"));
        assert!(requests[2].body.is_empty());
        assert_eq!(requests[3].header("content-range"), Some("bytes 4-9/10"));
        assert_eq!(requests[3].body, b"456789");
    }

    #[test]
    fn test_upload_permanent_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nightly_20240201_000000.tar.gz");
        std::fs::write(&path, b"data").unwrap();

        let server = TestServer::bind();
        let drive = client(&server, 5, 1024);
        let (recorded, handle) = server.serve(vec![reply(
            404,
            r#"{"error": {"message": "File not found: folder123."}}"#,
        )]);

        let err = drive
            .upload(&test_session(), &path, "folder123")
            .unwrap_err();
        handle.join().unwrap();

        assert!(matches!(
            err,
            BackupError::UploadFailure {
                transient: false,
                ..
            }
        ));
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rate_limit_is_transient() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nightly_20240201_000000.tar.gz");
        std::fs::write(&path, b"data").unwrap();

        let server = TestServer::bind();
        let drive = client(&server, 1, 1024);
        let (_recorded, handle) = server.serve(vec![reply(
            403,
            r#"{"error": {"message": "Rate limit", "errors": [{"reason": "userRateLimitExceeded"}]}}"#,
        )]);

        let err = drive
            .upload(&test_session(), &path, "folder123")
            .unwrap_err();
        handle.join().unwrap();

        assert!(err.is_transient());
    }

    #[test]
    fn test_range_end() {
        assert_eq!(range_end("bytes=0-42"), Some(42));
        assert_eq!(range_end("bytes=0-"), None);
        assert_eq!(range_end("0-42"), None);
    }

    #[test]
    fn test_file_url_escapes_id() {
        let drive = DriveClient::new(RetryPolicy::no_retry(), 1024).unwrap();
        let url = drive.file_url(&RemoteId::new("a/b c")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/drive/v3/files/a%2Fb%20c"
        );
    }
}
