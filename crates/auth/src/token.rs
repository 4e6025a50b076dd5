//! Session token acquisition and freshness.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sealpost_http::{ApiRequest, ProxyCredentials, Transport};
use sealpost_protocol::{TokenEnvelope, UntrustedClaims};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{AuthError, TimeSource};

/// Safety margin applied before a token's `exp`.
pub const DEFAULT_MARGIN: Duration = Duration::from_secs(5 * 60);

/// A bearer token with its unverified claims.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub claims: UntrustedClaims,
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

/// `true` iff `now + margin >= exp`.
pub fn is_expired(claims: &UntrustedClaims, margin: Duration, now: DateTime<Utc>) -> bool {
    let margin_ms = i64::try_from(margin.as_millis()).unwrap_or(i64::MAX);
    let deadline_ms = claims.exp.saturating_mul(1000);
    now.timestamp_millis().saturating_add(margin_ms) >= deadline_ms
}

/// Acquires session tokens from the proxy and keeps the current one fresh.
///
/// There is no refresh endpoint: refreshing re-authenticates from scratch
/// with the operator's long-lived credentials.
pub struct TokenManager {
    transport: Arc<dyn Transport>,
    instance_url: String,
    credentials: ProxyCredentials,
    time: Arc<dyn TimeSource>,
    margin: Duration,
    current: Mutex<Option<SessionToken>>,
}

impl TokenManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        instance_url: impl Into<String>,
        credentials: ProxyCredentials,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            transport,
            instance_url: instance_url.into(),
            credentials,
            time,
            margin: DEFAULT_MARGIN,
            current: Mutex::new(None),
        }
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Requests a new token from `{instance}/gettoken`.
    pub async fn acquire(&self) -> Result<SessionToken, AuthError> {
        let url = format!("{}/gettoken", self.instance_url);
        let req = self.credentials.authorize(ApiRequest::get(url));
        let resp = self.transport.execute(req).await?;

        if !resp.is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenRejected { status, body });
        }

        let envelope: TokenEnvelope = resp.json().await?;
        let claims = UntrustedClaims::decode(&envelope.token)?;
        info!(user = %claims.user, exp = claims.exp, "session token acquired");

        Ok(SessionToken {
            token: envelope.token,
            claims,
        })
    }

    /// Same as [`acquire`](Self::acquire), and replaces the cached token.
    pub async fn refresh(&self) -> Result<SessionToken, AuthError> {
        let token = self.acquire().await?;
        *self.current.lock().await = Some(token.clone());
        Ok(token)
    }

    /// Checks `claims` against trusted time with the configured margin.
    pub async fn is_expired(&self, claims: &UntrustedClaims) -> Result<bool, AuthError> {
        let now = self.time.now().await?;
        Ok(is_expired(claims, self.margin, now))
    }

    /// Returns the cached token, acquiring one on first use and
    /// re-acquiring once it is within the margin of expiry.
    pub async fn ensure_fresh(&self) -> Result<SessionToken, AuthError> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if !self.is_expired(&token.claims).await? {
                return Ok(token.clone());
            }
            info!(user = %token.claims.user, "session token about to expire, refreshing");
        } else {
            debug!("no session token yet");
        }

        let token = self.acquire().await?;
        *current = Some(token.clone());
        Ok(token)
    }
}
