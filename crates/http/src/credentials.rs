//! Request authentication.
//!
//! Proxied calls carry the operator's long-lived token in
//! `Proxy-Authorization` plus a basic credential pair; direct calls carry
//! a short-lived session token in `Authorization`.

use std::fmt;

use crate::ApiRequest;

/// The operator's long-lived credentials for the proxy.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
    pub proxy_token: String,
}

impl ProxyCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        proxy_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            proxy_token: proxy_token.into(),
        }
    }

    /// Adds the proxy bearer and, when both halves are set, basic auth.
    pub fn authorize(&self, request: ApiRequest) -> ApiRequest {
        let request = self.proxy_bearer(request);
        if self.username.is_empty() || self.password.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, &self.password)
        }
    }

    /// Adds only the proxy bearer.
    pub fn proxy_bearer(&self, request: ApiRequest) -> ApiRequest {
        request.header("Proxy-Authorization", format!("Bearer {}", self.proxy_token))
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("proxy_token", &"<redacted>")
            .finish()
    }
}

/// Adds a session bearer token.
pub fn bearer(request: ApiRequest, token: &str) -> ApiRequest {
    request.header("Authorization", format!("Bearer {token}"))
}
