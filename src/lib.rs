//! campus-login - Auto-login client for Dr.COM ePortal campus gateways
//!
//! Logs in with form credentials, force-logs-out sessions by MAC address and
//! reads quota usage from the gateway's JSONP endpoint.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod parser;
pub mod portal;
pub mod retry;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use error::{ConfigError, FailureKind, PayloadError, TransportError};
pub use http::{HttpClient, Transport};
pub use models::{
    Credentials, GatewaySettings, LoginOutcome, RawResponse, UsageOutcome, DEFAULT_LOGOUT_MAC,
};
pub use portal::EPortal;
