//! `reqwest`-backed transport.

use futures_util::StreamExt;
use tracing::debug;

use crate::{ApiRequest, ApiResponse, BoxFuture, HttpError, Method, Transport};

/// Production [`Transport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a sealpost user agent.
    pub fn new() -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sealpost/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// Wraps an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, HttpError>> {
        Box::pin(async move {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Patch => reqwest::Method::PATCH,
                Method::Delete => reqwest::Method::DELETE,
            };
            debug!(method = %method, url = %request.url, "sending request");

            let mut builder = self.http.request(method, &request.url);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some((username, password)) = &request.basic_auth {
                builder = builder.basic_auth(username, Some(password));
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await?;
            let status = resp.status().as_u16();
            debug!(status, url = %request.url, "response received");

            let body = resp
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()).map_err(HttpError::from));
            Ok(ApiResponse::new(status, Box::pin(body)))
        })
    }
}
