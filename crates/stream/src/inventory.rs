//! Remote listings: the inbox, the outbox, and resumable uploads.

use std::sync::Arc;

use sealpost_http::{ApiRequest, BoxFuture, ProxyCredentials, Transport};
use sealpost_protocol::{FileList, RemoteFile, ResumableList, ResumableRecord};
use tracing::{debug, info};

use crate::StreamError;
use crate::error::check_status;

/// Read access to what the service already holds for this user.
pub trait Inventory: Send + Sync {
    /// Files in the inbox (`inbox = true`) or the outbox.
    fn list_files(&self, inbox: bool) -> BoxFuture<'_, Result<Vec<RemoteFile>, StreamError>>;

    /// Partially uploaded files the service can continue.
    fn list_resumables(&self) -> BoxFuture<'_, Result<Vec<ResumableRecord>, StreamError>>;
}

/// [`Inventory`] backed by the proxy's `/files` and `/resumables` endpoints.
pub struct HttpInventory {
    transport: Arc<dyn Transport>,
    instance_url: String,
    credentials: ProxyCredentials,
}

impl HttpInventory {
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

    /// Removes a file from the inbox.
    pub async fn delete_file(&self, file_name: &str) -> Result<(), StreamError> {
        let req = ApiRequest::delete(format!("{}/files", self.instance_url))
            .query("fileName", file_name);
        check_status(self.transport.execute(self.credentials.authorize(req)).await?).await?;
        info!(file = %file_name, "inbox file deleted");
        Ok(())
    }

    /// Discards a resumable upload.
    pub async fn delete_resumable(&self, upload_id: &str) -> Result<(), StreamError> {
        let req = ApiRequest::delete(format!("{}/resumables", self.instance_url))
            .query("uploadId", upload_id);
        check_status(self.transport.execute(self.credentials.authorize(req)).await?).await?;
        info!(upload_id = %upload_id, "resumable upload deleted");
        Ok(())
    }
}

impl Inventory for HttpInventory {
    fn list_files(&self, inbox: bool) -> BoxFuture<'_, Result<Vec<RemoteFile>, StreamError>> {
        Box::pin(async move {
            let req = ApiRequest::get(format!("{}/files", self.instance_url))
                .query("inbox", inbox.to_string());
            let resp = check_status(self.transport.execute(self.credentials.authorize(req)).await?)
                .await?;
            let list: FileList = resp.json().await?;
            debug!(inbox, count = list.files.len(), "files listed");
            Ok(list.files)
        })
    }

    fn list_resumables(&self) -> BoxFuture<'_, Result<Vec<ResumableRecord>, StreamError>> {
        Box::pin(async move {
            let req = ApiRequest::get(format!("{}/resumables", self.instance_url));
            let resp = check_status(self.transport.execute(self.credentials.authorize(req)).await?)
                .await?;
            let list: ResumableList = resp.json().await?;
            debug!(count = list.resumables.len(), "resumables listed");
            Ok(list.resumables)
        })
    }
}
