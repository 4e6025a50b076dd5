//! Unverified token payload.
//!
//! Session tokens are JWT-shaped (`header.payload.signature`). The client
//! trusts the proxy that issued the token, not the token itself, so the
//! payload is decoded for its `user` and `exp` fields and the signature is
//! never looked at.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Claims read from a token payload without signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntrustedClaims {
    pub user: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl UntrustedClaims {
    /// Decodes the payload segment of `token`.
    pub fn decode(token: &str) -> Result<Self, ProtocolError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => {
                return Err(ProtocolError::MalformedToken(
                    "expected three dot-separated segments".into(),
                ));
            }
        };
        if payload.is_empty() {
            return Err(ProtocolError::MalformedToken("empty payload segment".into()));
        }

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
