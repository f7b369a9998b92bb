//! Network function abstraction.
//!
//! The handler never performs I/O itself; it calls an injected `Fetcher`.
//! Errors are the fetcher's own type and reach the caller unchanged.
//! Timeouts belong to the fetcher.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use thiserror::Error;

/// Performs one network request
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>, Self::Error>;
}

/// Adapter turning an async closure into a `Fetcher`
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap `f` so it can be used as the handler's network function
///
/// ```
/// use bytes::Bytes;
/// use fetch_cache::network::fetch_fn;
/// use http::{Request, Response};
///
/// let fetcher = fetch_fn(|_req: Request<Bytes>| async {
///     Ok::<_, std::io::Error>(Response::new(Bytes::from_static(b"ok")))
/// });
/// # let _ = fetcher;
/// ```
pub fn fetch_fn<F, Fut, E>(f: F) -> FnFetcher<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Bytes>, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut, E> Fetcher for FnFetcher<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Bytes>, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>, E> {
        (self.f)(request).await
    }
}

/// Errors raised by `ReqwestFetcher`
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request cannot be sent: {0}")]
    InvalidRequest(String),

    #[error("Response cannot be converted: {0}")]
    InvalidResponse(String),
}

/// Default network function backed by a shared reqwest client
#[derive(Clone, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    type Error = FetchError;

    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>, FetchError> {
        let (parts, body) = request.into_parts();

        // reqwest 0.11 is built on http 0.2, so cross over via strings and bytes
        let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        let mut builder = self.client.request(method, parts.uri.to_string());
        for (name, value) in parts.headers.iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }

        let upstream = builder.body(body).send().await?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        let mut response = Response::builder().status(status);
        for (name, value) in upstream.headers().iter() {
            let name = HeaderName::from_bytes(name.as_str().as_bytes())
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
            let value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
            response = response.header(name, value);
        }
        let body = upstream.bytes().await?;

        response
            .body(body)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}
