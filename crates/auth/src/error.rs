//! Token and trusted-time error types.

use sealpost_http::HttpError;
use sealpost_protocol::ProtocolError;

/// Errors produced while acquiring tokens or resolving trusted time.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("token request rejected with status {status}: {body}")]
    TokenRejected { status: u16, body: String },

    #[error("malformed token: {0}")]
    MalformedToken(#[from] ProtocolError),

    #[error("no trusted time server reachable (tried: {servers})")]
    TimeUnavailable { servers: String },
}
