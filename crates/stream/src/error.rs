//! Stream error types.

use sealpost_auth::AuthError;
use sealpost_http::{ApiResponse, HttpError};
use sealpost_transfer::{ContainerError, TransferError};

/// Errors produced by upload and download flows.
///
/// Every error aborts the current operation; nothing is retried and
/// nothing already accepted by the server is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("{file}: {source}")]
    InvalidContainer {
        file: String,
        #[source]
        source: ContainerError,
    },

    #[error(
        "File {file} is already uploaded. Please, remove it from the inbox first: sealpost files --delete {remote}"
    )]
    AlreadyUploaded { file: String, remote: String },

    #[error("File {0} exists locally, aborting.")]
    ExistsLocally(String),

    #[error("File {0} not found in the outbox.")]
    NotInOutbox(String),

    #[error("server rejected request: {status} {body}")]
    Rejected { status: u16, body: String },

    #[error("server acknowledged no chunk of {0}, nothing to finalize")]
    MissingUploadId(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Passes success responses through and turns anything else into
/// [`StreamError::Rejected`].
pub(crate) async fn check_status(resp: ApiResponse) -> Result<ApiResponse, StreamError> {
    if resp.is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(StreamError::Rejected {
        status,
        body: body.trim().to_string(),
    })
}
