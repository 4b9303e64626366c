//! Dr.COM ePortal gateway client
//!
//! Login, forced logout and data usage queries against the campus gateway.
//! Every call returns an outcome record; nothing here fails the caller.

use crate::error::{FailureKind, PayloadError};
use crate::http::{HttpClient, Transport};
use crate::models::{
    Credentials, GatewaySettings, LoginOutcome, UsageOutcome, DEFAULT_LOGOUT_MAC,
};
use crate::parser;
use crate::portal::urls;
use crate::retry::{retry_login, RetryPolicy};
use reqwest::header::REFERER;

/// Gateway facade over a [`Transport`].
///
/// Holds no state between calls apart from the transport's connection pool.
pub struct EPortal<T = HttpClient> {
    transport: T,
}

impl<T: Transport> EPortal<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Log in, retrying per `settings`
    pub async fn login(&self, creds: &Credentials, settings: &GatewaySettings) -> LoginOutcome {
        let policy = RetryPolicy::from_settings(settings);
        retry_login(policy, move || self.attempt_login(creds, settings)).await
    }

    /// One login POST, classified
    pub async fn attempt_login(
        &self,
        creds: &Credentials,
        settings: &GatewaySettings,
    ) -> LoginOutcome {
        let url = urls::login_url(&settings.base_url);
        tracing::info!("Attempting to log in to {} as {}", url, creds.username);

        let form = [
            ("DDDDD", creds.username.as_str()),
            ("upass", creds.password.as_str()),
        ];

        match self.transport.post_form(&url, &form).await {
            Ok(resp) => {
                let outcome = parser::classify_login(&resp);
                if !outcome.success {
                    tracing::debug!("Login response body: {}", resp.body);
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("Network error during login attempt: {}", e.0);
                LoginOutcome::from_transport(&e)
            }
        }
    }

    /// Force-disconnect the session bound to `mac` (single attempt)
    pub async fn logout(&self, settings: &GatewaySettings, mac: &str) -> LoginOutcome {
        let url = urls::logout_url(&settings.base_url, mac);
        tracing::info!("Attempting to log out device with MAC address: {}", mac);

        match self.transport.get(&url, &[]).await {
            Ok(resp) => {
                let outcome = parser::classify_logout(&resp, mac);
                if !outcome.success {
                    tracing::debug!("Logout response body: {}", resp.body);
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("Network error during logout attempt: {}", e.0);
                LoginOutcome::from_transport(&e)
            }
        }
    }

    /// [`logout`](Self::logout) with the gateway's broadcast MAC
    pub async fn logout_default(&self, settings: &GatewaySettings) -> LoginOutcome {
        self.logout(settings, DEFAULT_LOGOUT_MAC).await
    }

    /// Query quota usage for `creds.username`.
    ///
    /// The endpoint only answers for an authenticated session, so callers log
    /// in first. This is not enforced here.
    pub async fn query_data_usage(
        &self,
        creds: &Credentials,
        settings: &GatewaySettings,
    ) -> UsageOutcome {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let callback = urls::jsonp_callback(timestamp);
        let url = urls::usage_url(&settings.base_url, &creds.username, &callback, timestamp);
        tracing::info!("Querying data usage for account {} from {}", creds.username, url);

        let headers = [(REFERER.as_str(), settings.base_url.as_str())];
        let resp = match self.transport.get(&url, &headers).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Network error during data usage query: {}", e.0);
                return UsageOutcome::from_transport(&e);
            }
        };

        if !resp.is_success() {
            tracing::debug!("Usage response body: {}", resp.body);
            return UsageOutcome::failed(
                FailureKind::HttpStatus,
                format!("Query failed with status code: {}", resp.status),
                Some(resp.status),
            );
        }

        match parser::parse_usage_body(&resp.body) {
            Ok((figures, message)) => UsageOutcome::from_figures(message, figures, resp.status),
            Err(e @ PayloadError::InvalidFormat) => {
                tracing::warn!("Invalid JSONP response format: {}", resp.body);
                UsageOutcome::failed(FailureKind::PayloadFormat, e.to_string(), Some(resp.status))
            }
            Err(e @ PayloadError::Rejected { .. }) => {
                UsageOutcome::failed(FailureKind::PayloadSemantic, e.to_string(), Some(resp.status))
            }
        }
    }
}
