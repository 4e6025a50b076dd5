//! Wire types spoken between the sealpost client and the submission service.
//!
//! Listing bodies, chunk acknowledgements and the token envelope are plain
//! serde structs; the token payload is decoded into [`UntrustedClaims`]
//! without any signature check.

pub mod claims;
pub mod envelope;
pub mod types;

// Re-export primary types for convenience.
pub use claims::UntrustedClaims;
pub use envelope::{ChunkAck, TokenEnvelope};
pub use types::{FileList, RemoteFile, ResumableList, ResumableRecord};

/// Errors produced while decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed token: {0}")]
    MalformedToken(String),
}
