//! Error types for gateway operations and configuration

use serde::Serialize;
use thiserror::Error;

/// Network-level failure: no HTTP response was received.
///
/// A response with a non-2xx status is *not* a transport error; it is handed
/// to the response classifier like any other response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Network error: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            format!("request timed out ({err})")
        } else if err.is_connect() {
            format!("connection failed ({err})")
        } else {
            err.to_string()
        };
        Self(cause)
    }
}

/// Usage payload could not be turned into figures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// Body is not `callback(...)` shaped.
    #[error("Invalid response format")]
    InvalidFormat,

    /// Payload parsed but the gateway did not report usable figures.
    #[error("Failed to query data usage: {message}")]
    Rejected { message: String },
}

/// Configuration loading and account selection errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to write configuration: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("refusing to overwrite existing file: {0}")]
    AlreadyExists(String),

    #[error("invalid account index {index} ({available} accounts configured)")]
    InvalidAccount { index: usize, available: usize },

    #[error("username or password not configured for account {0}")]
    MissingCredentials(usize),

    #[error("no accounts configured")]
    NoAccounts,

    #[error("gateway base_url is not configured")]
    MissingBaseUrl,
}

/// Why an outcome failed, one variant per failure class the gateway produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// DNS, connect, read or write failure.
    Transport,
    /// Response status outside 200-299.
    HttpStatus,
    /// 2xx response without any recognised marker.
    Classification,
    /// 2xx response carrying the incorrect-credentials marker.
    Credentials,
    /// Usage body is not JSONP.
    PayloadFormat,
    /// Usage payload parsed but `result != "ok"` or figures are missing.
    PayloadSemantic,
}

impl FailureKind {
    /// Whether a login attempt that failed this way is worth repeating.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Transport | Self::HttpStatus | Self::Classification | Self::Credentials
        )
    }
}
