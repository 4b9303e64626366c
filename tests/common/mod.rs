//! Shared fixtures for gateway integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use campus_login::{HttpClient, RawResponse, Transport, TransportError};
use wiremock::MockServer;

/// Host the tests configure as the gateway base URL
pub const GATEWAY_BASE: &str = "http://gateway.test/";
const GATEWAY_ORIGIN: &str = "http://gateway.test:801";

/// Real [`HttpClient`] whose requests to the gateway's management port land
/// on a mock server instead.
pub struct MockGateway {
    client: HttpClient,
    target: String,
}

impl MockGateway {
    pub fn new(server: &MockServer) -> Self {
        Self::with_target(server.uri())
    }

    /// Route gateway requests to a port nothing listens on
    pub fn unreachable() -> Self {
        Self::with_target(closed_port_url().trim_end_matches('/').to_string())
    }

    fn with_target(target: String) -> Self {
        Self {
            client: HttpClient::new().expect("client build"),
            target,
        }
    }

    fn rewrite(&self, url: &str) -> String {
        match url.strip_prefix(GATEWAY_ORIGIN) {
            Some(rest) => format!("{}{}", self.target, rest),
            None => url.to_string(),
        }
    }
}

#[async_trait]
impl Transport for MockGateway {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        self.client.get(&self.rewrite(url), headers).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<RawResponse, TransportError> {
        self.client.post_form(&self.rewrite(url), form).await
    }
}

/// A localhost URL nothing is listening on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}
