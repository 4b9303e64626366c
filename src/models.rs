//! Data models for ePortal authentication

use crate::error::{FailureKind, TransportError};
use serde::Serialize;
use std::time::Duration;

/// MAC address the gateway treats as "disconnect this session".
pub const DEFAULT_LOGOUT_MAC: &str = "111111111111";

const BYTES_PER_MB: i64 = 1024 * 1024;

/// Login credentials for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Gateway location and login retry behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Base host URL, e.g. `http://10.3.38.8/`. Port 801 is appended.
    pub base_url: String,
    pub auto_retry: bool,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auto_retry: true,
            max_retries: 3,
            retry_delay: Duration::from_millis(2000),
        }
    }

    pub fn without_retry(mut self) -> Self {
        self.auto_retry = false;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.auto_retry = true;
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }
}

/// Raw HTTP result handed from the transport to the classifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of a login or logout call.
///
/// `http_status == None` on failure means no response was received at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    pub http_status: Option<u16>,
    pub failure: Option<FailureKind>,
}

impl LoginOutcome {
    pub fn succeeded(message: impl Into<String>, status: u16) -> Self {
        Self {
            success: true,
            message: message.into(),
            http_status: Some(status),
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            http_status: Some(status),
            failure: Some(kind),
        }
    }

    pub fn from_transport(err: &TransportError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            http_status: None,
            failure: Some(FailureKind::Transport),
        }
    }
}

/// Quota figures reported by the gateway, in whole megabytes.
///
/// Only built through [`UsageFigures::new`], so every derived byte count is
/// known to fit in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageFigures {
    used_mb: i64,
    total_mb: i64,
    remaining_mb: i64,
    used_bytes: i64,
    total_bytes: i64,
    remaining_bytes: i64,
}

impl UsageFigures {
    /// `None` for negative figures or ones whose byte counts overflow.
    pub fn new(used_mb: i64, total_mb: i64) -> Option<Self> {
        if used_mb < 0 || total_mb < 0 {
            return None;
        }
        let remaining_mb = total_mb.checked_sub(used_mb)?;

        Some(Self {
            used_mb,
            total_mb,
            remaining_mb,
            used_bytes: used_mb.checked_mul(BYTES_PER_MB)?,
            total_bytes: total_mb.checked_mul(BYTES_PER_MB)?,
            remaining_bytes: remaining_mb.checked_mul(BYTES_PER_MB)?,
        })
    }

    pub fn used_mb(&self) -> i64 {
        self.used_mb
    }

    pub fn total_mb(&self) -> i64 {
        self.total_mb
    }

    /// Not clamped: negative when usage exceeds the quota.
    pub fn remaining_mb(&self) -> i64 {
        self.remaining_mb
    }
}

/// Result of a data usage query.
///
/// On success `raw_used_mb`/`raw_total_mb` are set and
/// `remaining_mb == raw_total_mb - raw_used_mb`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageOutcome {
    pub success: bool,
    pub message: String,
    pub used_bytes: Option<i64>,
    pub used_mb: Option<f64>,
    pub total_bytes: Option<i64>,
    pub total_mb: Option<f64>,
    pub remaining_bytes: Option<i64>,
    pub remaining_mb: Option<f64>,
    pub raw_used_mb: Option<i64>,
    pub raw_total_mb: Option<i64>,
    pub http_status: Option<u16>,
    pub failure: Option<FailureKind>,
}

impl UsageOutcome {
    pub fn from_figures(message: impl Into<String>, figures: UsageFigures, status: u16) -> Self {
        Self {
            success: true,
            message: message.into(),
            used_bytes: Some(figures.used_bytes),
            used_mb: Some(figures.used_mb as f64),
            total_bytes: Some(figures.total_bytes),
            total_mb: Some(figures.total_mb as f64),
            remaining_bytes: Some(figures.remaining_bytes),
            remaining_mb: Some(figures.remaining_mb as f64),
            raw_used_mb: Some(figures.used_mb),
            raw_total_mb: Some(figures.total_mb),
            http_status: Some(status),
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            success: false,
            message: message.into(),
            used_bytes: None,
            used_mb: None,
            total_bytes: None,
            total_mb: None,
            remaining_bytes: None,
            remaining_mb: None,
            raw_used_mb: None,
            raw_total_mb: None,
            http_status: status,
            failure: Some(kind),
        }
    }

    pub fn from_transport(err: &TransportError) -> Self {
        Self::failed(FailureKind::Transport, err.to_string(), None)
    }
}
