//! HTTP transport with fixed timeouts, a shared connection pool and cookie support

use crate::error::TransportError;
use crate::models::RawResponse;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const CLIENT_USER_AGENT: &str = "CampusAutoLogin/1.0";

/// One-request-at-a-time HTTP access used by the portal.
///
/// Implementations must return non-2xx responses as `Ok`; only failures to
/// obtain a response at all are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse, TransportError>;

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport. Cheap to clone; clones share one pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self { inner: client })
    }

    /// Send and drain the body so the connection goes back to the pool
    async fn execute(&self, request: RequestBuilder) -> Result<RawResponse, TransportError> {
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        tracing::debug!("Response {}, body length: {}", status, body.len());
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        let mut extra = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError(format!("invalid header value '{value}': {e}")))?;
            extra.insert(name, value);
        }

        self.execute(self.inner.get(url).headers(extra)).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<RawResponse, TransportError> {
        self.execute(self.inner.post(url).form(form)).await
    }
}
