//! The two upload routes: through the proxy, or straight to the storage
//! backend with a session token.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sealpost_auth::TokenManager;
use sealpost_http::{ApiRequest, BoxFuture, ProxyCredentials, Transport, bearer, encode_segment};
use sealpost_protocol::ChunkAck;
use tracing::debug;

use crate::StreamError;
use crate::error::check_status;

/// One chunk as handed to a strategy.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    /// 1-based chunk index.
    pub index: u64,
    /// Lowercase hex MD5 of `data`.
    pub md5: String,
    pub data: Vec<u8>,
}

/// Values the finalize call declares for the assembled file.
#[derive(Debug, Clone, Copy)]
pub struct FinalizeRequest<'a> {
    pub upload_id: &'a str,
    pub file_size: u64,
    pub sha256: &'a str,
}

/// Sends chunks and the closing finalize call for one route.
pub trait UploadStrategy: Send + Sync {
    /// Sends one chunk; `upload_id` is `None` only for the very first chunk
    /// of a fresh upload.
    fn upload_chunk<'a>(
        &'a self,
        file_name: &'a str,
        chunk: ChunkRequest,
        upload_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ChunkAck, StreamError>>;

    /// Asks the server to assemble the upload.
    fn finalize<'a>(
        &'a self,
        file_name: &'a str,
        request: FinalizeRequest<'a>,
    ) -> BoxFuture<'a, Result<(), StreamError>>;
}

/// `{instance}/stream/{name}`
pub(crate) fn stream_url(instance_url: &str, file_name: &str) -> String {
    format!("{instance_url}/stream/{}", encode_segment(file_name))
}

/// `{tsd}/{user}/files/{name}`
pub(crate) fn direct_url(tsd_url: &str, user: &str, file_name: &str) -> String {
    format!(
        "{tsd_url}/{}/files/{}",
        encode_segment(user),
        encode_segment(file_name)
    )
}

/// Uploads through the proxy, authenticated with the operator's
/// long-lived credentials.
pub struct ProxiedUpload {
    transport: Arc<dyn Transport>,
    instance_url: String,
    credentials: ProxyCredentials,
}

impl ProxiedUpload {
    pub fn new(
        transport: Arc<dyn Transport>,
        instance_url: impl Into<String>,
        credentials: ProxyCredentials,
    ) -> Self {
        Self {
            transport,
            instance_url: instance_url.into(),
            credentials,
        }
    }
}

impl UploadStrategy for ProxiedUpload {
    fn upload_chunk<'a>(
        &'a self,
        file_name: &'a str,
        chunk: ChunkRequest,
        upload_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ChunkAck, StreamError>> {
        Box::pin(async move {
            let mut req = ApiRequest::patch(stream_url(&self.instance_url, file_name))
                .query("chunk", chunk.index.to_string())
                .query("md5", chunk.md5);
            if let Some(id) = upload_id {
                req = req.query("uploadId", id);
            }
            let req = self.credentials.authorize(req.body(chunk.data));

            let resp = check_status(self.transport.execute(req).await?).await?;
            Ok(resp.json().await?)
        })
    }

    fn finalize<'a>(
        &'a self,
        file_name: &'a str,
        request: FinalizeRequest<'a>,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        Box::pin(async move {
            let req = ApiRequest::patch(stream_url(&self.instance_url, file_name))
                .query("uploadId", request.upload_id)
                .query("chunk", "end")
                .query("fileSize", request.file_size.to_string())
                .query("sha256", request.sha256);
            let req = self.credentials.authorize(req);

            check_status(self.transport.execute(req).await?).await?;
            Ok(())
        })
    }
}

/// Uploads straight to the storage backend with a short-lived session
/// token, refreshed before any request that would otherwise carry an
/// expiring one.
pub struct DirectUpload {
    transport: Arc<dyn Transport>,
    tsd_url: String,
    tokens: Arc<TokenManager>,
}

impl DirectUpload {
    pub fn new(
        transport: Arc<dyn Transport>,
        tsd_url: impl Into<String>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            transport,
            tsd_url: tsd_url.into(),
            tokens,
        }
    }
}

impl UploadStrategy for DirectUpload {
    fn upload_chunk<'a>(
        &'a self,
        file_name: &'a str,
        chunk: ChunkRequest,
        upload_id: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ChunkAck, StreamError>> {
        Box::pin(async move {
            let session = self.tokens.ensure_fresh().await?;
            let url = direct_url(&self.tsd_url, &session.claims.user, file_name);

            // The backend takes the digest as a Content-MD5 header.
            let raw = hex::decode(&chunk.md5)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            let mut req = ApiRequest::patch(url)
                .query("chunk", chunk.index.to_string())
                .header("Content-MD5", STANDARD.encode(raw));
            if let Some(id) = upload_id {
                req = req.query("id", id);
            }
            let req = bearer(req.body(chunk.data), &session.token);

            let resp = check_status(self.transport.execute(req).await?).await?;
            Ok(resp.json().await?)
        })
    }

    fn finalize<'a>(
        &'a self,
        file_name: &'a str,
        request: FinalizeRequest<'a>,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        Box::pin(async move {
            let session = self.tokens.ensure_fresh().await?;
            // The backend's finalize call has no size or digest slot.
            debug!(
                file = %file_name,
                size = request.file_size,
                sha256 = %request.sha256,
                "finalizing direct upload"
            );
            let req = ApiRequest::patch(direct_url(&self.tsd_url, &session.claims.user, file_name))
                .query("chunk", "end")
                .query("id", request.upload_id);
            let req = bearer(req, &session.token);

            check_status(self.transport.execute(req).await?).await?;
            Ok(())
        })
    }
}
