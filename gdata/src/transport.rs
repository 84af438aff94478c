//! The HTTP seam between the GData client and the network.
//!
//! The client only ever talks to a [`Transport`]: it hands over a fully assembled
//! [`Request`] (method, URL, headers, optional body, optional timeout) and gets back the
//! status code and raw body. Retries, proxies, and connection pooling all live behind this
//! trait. [`ReqwestTransport`] is the default implementation on top of the blocking
//! `reqwest` client.

use http::{HeaderMap, Method, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A single request as the client wants it sent.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// Upper bound for this one call; `None` defers to the transport's own default.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Some(body.into()),
            timeout: None,
        }
    }
}

/// What came back from the server.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

/// The transport could not complete the request.
#[derive(Debug, Error)]
#[error("send {method} request to YouTube API: {url}")]
pub struct TransportError {
    method: Method,
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(
        request: &Request,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            source: source.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Issues HTTP requests on behalf of the client.
///
/// Implementations must be blocking: `fetch` returns once the whole body has been read.
pub trait Transport: fmt::Debug + Send + Sync {
    fn fetch(&self, request: Request) -> Result<Response, TransportError>;
}

/// [`Transport`] backed by [`reqwest::blocking::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already configured client, e.g. one with a proxy or custom TLS roots.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    #[tracing::instrument(skip_all, fields(method = %request.method, url = %request.url), level = tracing::Level::TRACE)]
    fn fetch(&self, request: Request) -> Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .map_err(|e| TransportError::new(&request, e))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::new(&request, e))?;

        tracing::trace!(%status, bytes = body.len(), "received response");
        Ok(Response { status, body })
    }
}
