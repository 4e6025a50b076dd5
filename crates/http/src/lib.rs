//! HTTP transport for the sealpost client.
//!
//! [`Transport`] is the single seam between the transfer logic and the
//! network: callers build an [`ApiRequest`], the transport sends it and
//! hands back an [`ApiResponse`] whose body can be collected or streamed.
//! [`ReqwestTransport`] is the production implementation; tests plug in
//! recording mocks.

pub mod client;
pub mod credentials;
pub mod error;
pub mod request;

pub use client::ReqwestTransport;
pub use credentials::{ProxyCredentials, bearer};
pub use error::HttpError;
pub use request::{ApiRequest, ApiResponse, BodyStream, BoxFuture, Method, encode_segment};

/// Sends requests to the service.
///
/// Boxed futures keep the trait object-safe so components can hold an
/// `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response with its status.
    ///
    /// Non-success statuses are not errors at this layer; callers decide
    /// which codes they accept.
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, HttpError>>;
}
