//! In-memory service double shared by the unit tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::DateTime;
use sealpost_auth::{AuthError, TimeSource, TokenManager};
use sealpost_http::{ApiRequest, ApiResponse, BoxFuture, HttpError, Method, ProxyCredentials, Transport};
use sealpost_protocol::{RemoteFile, ResumableRecord};
use sealpost_transfer::{MAGIC, VERSION, md5_hex};

use crate::{HttpInventory, ProxiedUpload, StreamSettings, Streamer};

pub(crate) const INSTANCE: &str = "http://localhost";
pub(crate) const TSD: &str = "http://tsd.local/v1/p969/ega";
pub(crate) const USER: &str = "p969-ega";
pub(crate) const UPLOAD_ID: &str = "123";
pub(crate) const NOW: i64 = 1_700_000_000;
/// SHA-256 of zero bytes.
pub(crate) const EMPTY_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub(crate) struct MockState {
    pub inbox: Vec<RemoteFile>,
    pub outbox: Vec<RemoteFile>,
    pub resumables: Vec<ResumableRecord>,
    /// Chunk index whose body is damaged on arrival.
    pub corrupt_chunk: Option<u64>,
    /// `(fileSize, sha256)` the proxied finalize must declare.
    pub expected_finalize: Option<(u64, String)>,
    pub download_body: Vec<u8>,
    pub token_ttl: i64,
    pub fail_listing: bool,
    requests: Vec<ApiRequest>,
    token_requests: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            inbox: Vec::new(),
            outbox: Vec::new(),
            resumables: Vec::new(),
            corrupt_chunk: None,
            expected_finalize: None,
            download_body: Vec::new(),
            token_ttl: 3600,
            fail_listing: false,
            requests: Vec::new(),
            token_requests: 0,
        }
    }
}

/// Plays both the proxy and the storage backend, recording every request.
///
/// Chunk digests are recomputed from the received body; a mismatch gets a
/// 500 the same way the real service answers one.
pub(crate) struct MockService {
    state: Mutex<MockState>,
}

impl MockService {
    pub fn new() -> Arc<Self> {
        Self::with(|_| {})
    }

    pub fn with(configure: impl FnOnce(&mut MockState)) -> Arc<Self> {
        let mut state = MockState::default();
        configure(&mut state);
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    /// Every request except token acquisition.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn chunk_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Patch && r.query_value("chunk") != Some("end"))
            .collect()
    }

    pub fn finalize_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Patch && r.query_value("chunk") == Some("end"))
            .collect()
    }

    pub fn token_requests(&self) -> usize {
        self.state.lock().unwrap().token_requests
    }

    fn respond(&self, req: ApiRequest) -> (u16, Vec<u8>) {
        let mut state = self.state.lock().unwrap();

        if req.url.ends_with("/gettoken") {
            state.token_requests += 1;
            return (200, token_body(NOW + state.token_ttl));
        }
        state.requests.push(req.clone());

        if req.url.ends_with("/files") || req.url.ends_with("/resumables") {
            if state.fail_listing {
                return (500, b"listing unavailable".to_vec());
            }
            return listing(&mut state, &req);
        }

        let direct = req.url.starts_with(TSD);
        let authorized = if direct {
            req.header_value("Authorization").is_some()
        } else {
            req.header_value("Proxy-Authorization").is_some()
        };
        if !authorized {
            return (401, b"unauthorized".to_vec());
        }

        match req.method {
            Method::Get => (200, state.download_body.clone()),
            Method::Patch => chunk_or_finalize(&state, &req, direct),
            Method::Delete => (405, Vec::new()),
        }
    }
}

impl Transport for MockService {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, HttpError>> {
        let (status, body) = self.respond(request);
        Box::pin(async move { Ok(ApiResponse::from_bytes(status, body)) })
    }
}

fn json(value: serde_json::Value) -> (u16, Vec<u8>) {
    (200, value.to_string().into_bytes())
}

fn listing(state: &mut MockState, req: &ApiRequest) -> (u16, Vec<u8>) {
    match (req.method, req.url.ends_with("/files")) {
        (Method::Get, true) => {
            let files = if req.query_value("inbox") == Some("true") {
                &state.inbox
            } else {
                &state.outbox
            };
            json(serde_json::json!({ "files": files }))
        }
        (Method::Get, false) => json(serde_json::json!({ "resumables": state.resumables })),
        (Method::Delete, true) => {
            let name = req.query_value("fileName").unwrap_or_default();
            state.inbox.retain(|f| f.base_name() != name);
            json(serde_json::json!({}))
        }
        (Method::Delete, false) => {
            let id = req.query_value("uploadId").unwrap_or_default();
            state.resumables.retain(|r| r.id != id);
            json(serde_json::json!({}))
        }
        _ => (405, Vec::new()),
    }
}

fn chunk_or_finalize(state: &MockState, req: &ApiRequest, direct: bool) -> (u16, Vec<u8>) {
    let id_param = if direct { "id" } else { "uploadId" };
    if let Some(id) = req.query_value(id_param) {
        if id != UPLOAD_ID {
            return (500, b"unknown upload id".to_vec());
        }
    }

    let Some(chunk) = req.query_value("chunk") else {
        return (400, b"missing chunk".to_vec());
    };
    if chunk == "end" {
        if let (false, Some((size, sha))) = (direct, &state.expected_finalize) {
            if req.query_value("fileSize") != Some(size.to_string().as_str())
                || req.query_value("sha256") != Some(sha.as_str())
            {
                return (500, b"checksum mismatch".to_vec());
            }
        }
        return json(serde_json::json!({ "id": UPLOAD_ID }));
    }

    let mut body = req.body.clone().unwrap_or_default();
    if state.corrupt_chunk.map(|n| n.to_string()).as_deref() == Some(chunk) {
        if let Some(first) = body.first_mut() {
            *first ^= 0xff;
        }
    }
    let claimed = if direct {
        req.header_value("Content-MD5")
            .and_then(|v| STANDARD.decode(v).ok())
            .map(hex::encode)
    } else {
        req.query_value("md5").map(str::to_string)
    };
    if claimed.as_deref() != Some(md5_hex(&body).as_str()) {
        return (500, b"checksum mismatch".to_vec());
    }
    json(serde_json::json!({ "id": UPLOAD_ID }))
}

fn token_body(exp: i64) -> Vec<u8> {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"user":"{USER}","exp":{exp}}}"#));
    serde_json::json!({ "token": format!("{header}.{payload}.sig") })
        .to_string()
        .into_bytes()
}

struct FixedClock;

impl TimeSource for FixedClock {
    fn now(&self) -> BoxFuture<'_, Result<chrono::DateTime<chrono::Utc>, AuthError>> {
        Box::pin(async move {
            DateTime::from_timestamp(NOW, 0).ok_or(AuthError::TimeUnavailable {
                servers: String::new(),
            })
        })
    }
}

pub(crate) fn credentials() -> ProxyCredentials {
    ProxyCredentials::new("user", "pass", "token")
}

pub(crate) fn token_manager(service: &Arc<MockService>) -> Arc<TokenManager> {
    Arc::new(TokenManager::new(
        Arc::clone(service) as Arc<dyn Transport>,
        INSTANCE,
        credentials(),
        Arc::new(FixedClock),
    ))
}

pub(crate) fn proxied(service: &Arc<MockService>) -> ProxiedUpload {
    ProxiedUpload::new(Arc::clone(service) as Arc<dyn Transport>, INSTANCE, credentials())
}

pub(crate) fn streamer(service: &Arc<MockService>, download_dir: &Path, chunk_size: usize) -> Streamer {
    let transport = Arc::clone(service) as Arc<dyn Transport>;
    let inventory = Arc::new(HttpInventory::new(
        Arc::clone(&transport),
        INSTANCE,
        credentials(),
    ));
    let settings = StreamSettings::new(INSTANCE, TSD)
        .with_chunk_size(chunk_size)
        .with_download_dir(download_dir);
    Streamer::new(
        transport,
        inventory,
        credentials(),
        token_manager(service),
        settings,
    )
}

pub(crate) fn remote(name: &str, size: u64) -> RemoteFile {
    RemoteFile {
        file_name: name.to_string(),
        size,
        modified_date: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// A Crypt4GH file of `total_len` bytes: a one-packet header followed by
/// filler standing in for the data segments.
pub(crate) fn container_bytes(total_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());

    let packet_len: u32 = 8 + 100;
    out.extend_from_slice(&packet_len.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend(std::iter::repeat_n(0xa5, 100));

    let mut i = 0u32;
    while out.len() < total_len {
        out.push((i.wrapping_mul(31) % 251) as u8);
        i += 1;
    }
    out.truncate(total_len);
    out
}

pub(crate) fn write_container(path: &Path, total_len: usize) -> Vec<u8> {
    let data = container_bytes(total_len);
    std::fs::write(path, &data).unwrap();
    data
}
