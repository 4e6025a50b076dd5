//! Path-level upload and name-level download.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use sealpost_auth::TokenManager;
use sealpost_http::{ApiRequest, BoxFuture, ProxyCredentials, Transport, bearer};
use sealpost_transfer::{
    ProgressTracker, TargetKind, TransferTarget, UploadSession, validate_file_name,
};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::check_status;
use crate::strategy::{DirectUpload, ProxiedUpload, UploadStrategy, direct_url, stream_url};
use crate::{ChunkUploader, Inventory, StreamError, StreamSettings};

/// Entry point for uploads and downloads.
///
/// Files are processed one at a time; a directory is walked in name order
/// and the first failing entry stops the walk.
pub struct Streamer {
    transport: Arc<dyn Transport>,
    inventory: Arc<dyn Inventory>,
    credentials: ProxyCredentials,
    tokens: Arc<TokenManager>,
    settings: StreamSettings,
    proxied: ProxiedUpload,
    direct: DirectUpload,
    progress: Arc<ProgressTracker>,
}

impl Streamer {
    pub fn new(
        transport: Arc<dyn Transport>,
        inventory: Arc<dyn Inventory>,
        credentials: ProxyCredentials,
        tokens: Arc<TokenManager>,
        settings: StreamSettings,
    ) -> Self {
        let proxied = ProxiedUpload::new(
            Arc::clone(&transport),
            settings.instance_url.clone(),
            credentials.clone(),
        );
        let direct = DirectUpload::new(
            Arc::clone(&transport),
            settings.tsd_url.clone(),
            Arc::clone(&tokens),
        );
        Self {
            transport,
            inventory,
            credentials,
            tokens,
            settings,
            proxied,
            direct,
            progress: Arc::new(ProgressTracker::new()),
        }
    }

    /// Shares a progress tracker with the caller.
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Uploads a file, or every entry of a directory recursively.
    ///
    /// With `resume`, each file continues its resumable record; a file
    /// without one is skipped.
    pub fn upload<'a>(
        &'a self,
        path: &'a Path,
        resume: bool,
        direct: bool,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        Box::pin(async move {
            let target = TransferTarget::resolve(path).await?;
            match target.kind {
                TargetKind::Directory => self.upload_directory(&target.path, resume, direct).await,
                TargetKind::File => self.upload_file(&target, resume, direct).await,
            }
        })
    }

    async fn upload_directory(
        &self,
        dir: &Path,
        resume: bool,
        direct: bool,
    ) -> Result<(), StreamError> {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            entries.push(entry.path());
        }
        entries.sort();
        info!(dir = %dir.display(), entries = entries.len(), "uploading directory");

        for entry in entries {
            let entry = std::path::absolute(&entry)?;
            self.upload(&entry, resume, direct).await?;
        }
        Ok(())
    }

    async fn upload_file(
        &self,
        target: &TransferTarget,
        resume: bool,
        direct: bool,
    ) -> Result<(), StreamError> {
        let session = if resume {
            let records = self.inventory.list_resumables().await?;
            match records.into_iter().find(|r| r.name == target.name) {
                Some(record) => {
                    info!(
                        file = %target.name,
                        upload_id = %record.id,
                        offset = record.size,
                        chunk = record.chunk,
                        "resuming upload"
                    );
                    UploadSession::resume(record.id, record.size, record.chunk)
                }
                None => {
                    warn!(file = %target.name, "no resumable upload found, skipping");
                    return Ok(());
                }
            }
        } else {
            UploadSession::fresh()
        };

        let strategy: &dyn UploadStrategy = if direct { &self.direct } else { &self.proxied };
        let file = File::open(&target.path).await?;
        ChunkUploader::new(
            self.inventory.as_ref(),
            strategy,
            &self.progress,
            self.settings.chunk_size,
        )
        .upload(
            &target.name,
            &target.path.display().to_string(),
            file,
            target.size,
            session,
        )
        .await
    }

    /// Downloads `file_name` from the outbox into the download directory.
    ///
    /// Refuses before any request if the destination already exists.
    pub async fn download(&self, file_name: &str, direct: bool) -> Result<PathBuf, StreamError> {
        validate_file_name(file_name)?;
        let dest = self.settings.download_dir.join(file_name);
        if tokio::fs::try_exists(&dest).await? {
            return Err(StreamError::ExistsLocally(file_name.to_string()));
        }

        let outbox = self.inventory.list_files(false).await?;
        let remote = outbox
            .iter()
            .find(|f| f.base_name() == file_name)
            .ok_or_else(|| StreamError::NotInOutbox(file_name.to_string()))?;
        let size = remote.size;

        let req = if direct {
            let session = self.tokens.ensure_fresh().await?;
            let url = direct_url(&self.settings.tsd_url, &session.claims.user, file_name);
            bearer(ApiRequest::get(url), &session.token)
        } else {
            let url = stream_url(&self.settings.instance_url, file_name);
            self.credentials.proxy_bearer(ApiRequest::get(url))
        };
        let resp = check_status(self.transport.execute(req).await?).await?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    StreamError::ExistsLocally(file_name.to_string())
                }
                _ => StreamError::Io(e),
            })?;
        info!(file = %file_name, size, dest = %dest.display(), "downloading");

        let mut progress = self.progress.begin(file_name, size, 0);
        let mut body = resp.into_stream();
        while let Some(bytes) = body.next().await {
            let bytes = bytes?;
            file.write_all(&bytes).await?;
            progress.advance(bytes.len() as u64);
        }
        file.flush().await?;
        progress.finish();

        info!(file = %file_name, "download complete");
        Ok(dest)
    }
}
