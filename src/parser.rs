//! Response classification and JSONP usage parsing
//!
//! The ePortal answers with HTML or JavaScript rather than a stable API, so
//! outcomes are decided by looking for marker strings in the raw body.

use crate::error::{FailureKind, PayloadError};
use crate::models::{LoginOutcome, RawResponse, UsageFigures};
use regex::Regex;
use serde_json::Value;

/// Page the gateway serves after a successful login.
const LOGIN_OK_PAGE: &str = "Dr.COMWebLoginID_3.htm";
/// Page the gateway serves when the username/password pair is rejected.
const LOGIN_REJECTED_PAGE: &str = "Dr.COMWebLoginID_2.htm";

const LOGIN_SUCCESS_MARKERS: [&str; 4] = [LOGIN_OK_PAGE, "success", "logged in", "登录成功"];
const LOGOUT_SUCCESS_MARKERS: [&str; 3] = ["success", "logged out", "注销成功"];

const UNKNOWN_MESSAGE: &str = "Unknown response";

/// Decide the outcome of a login POST
pub fn classify_login(resp: &RawResponse) -> LoginOutcome {
    if !resp.is_success() {
        return LoginOutcome::failed(
            FailureKind::HttpStatus,
            format!("Login failed with status code: {}", resp.status),
            resp.status,
        );
    }

    if contains_any(&resp.body, &LOGIN_SUCCESS_MARKERS) {
        LoginOutcome::succeeded("Login successful", resp.status)
    } else if resp.body.contains(LOGIN_REJECTED_PAGE) {
        LoginOutcome::failed(
            FailureKind::Credentials,
            "Login failed: incorrect credentials",
            resp.status,
        )
    } else {
        LoginOutcome::failed(
            FailureKind::Classification,
            "Login may have failed: unexpected response content",
            resp.status,
        )
    }
}

/// Decide the outcome of a logout GET for `mac`
pub fn classify_logout(resp: &RawResponse, mac: &str) -> LoginOutcome {
    if !resp.is_success() {
        return LoginOutcome::failed(
            FailureKind::HttpStatus,
            format!("Logout failed with status code: {}", resp.status),
            resp.status,
        );
    }

    if contains_any(&resp.body, &LOGOUT_SUCCESS_MARKERS) {
        LoginOutcome::succeeded(
            format!("Device with MAC {mac} logged out successfully"),
            resp.status,
        )
    } else {
        LoginOutcome::failed(
            FailureKind::Classification,
            "Logout may have failed: unexpected response content",
            resp.status,
        )
    }
}

fn contains_any(body: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| body.contains(m))
}

/// Fields the usage endpoint may report. Each one is independently optional.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsageFields {
    pub result: Option<String>,
    pub msg: Option<String>,
    /// Total quota in MB.
    pub userflow: Option<i64>,
    /// Used quota in MB.
    pub useflow: Option<i64>,
}

/// Return the text strictly between the first `(` and the last `)`
pub fn strip_jsonp(body: &str) -> Result<&str, PayloadError> {
    match (body.find('('), body.rfind(')')) {
        (Some(start), Some(end)) if start < end => Ok(&body[start + 1..end]),
        _ => Err(PayloadError::InvalidFormat),
    }
}

/// Pull the four usage fields out of the JSON payload.
///
/// Strict JSON goes through serde_json; anything else (the gateway sometimes
/// emits JavaScript object literals) falls back to pattern extraction.
pub fn extract_usage_fields(payload: &str) -> UsageFields {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => UsageFields {
            result: map.get("result").and_then(string_field),
            msg: map.get("msg").and_then(string_field),
            userflow: map.get("userflow").and_then(integer_field),
            useflow: map.get("useflow").and_then(integer_field),
        },
        Ok(other) => {
            tracing::debug!("Usage payload is JSON but not an object: {}", other);
            UsageFields::default()
        }
        Err(e) => {
            tracing::debug!("Usage payload is not strict JSON ({}), using pattern extraction", e);
            extract_with_patterns(payload)
        }
    }
}

fn string_field(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn integer_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn extract_with_patterns(payload: &str) -> UsageFields {
    fn extract_string(payload: &str, key: &str) -> Option<String> {
        let pattern = format!(r#"["']?{}["']?\s*:\s*["']([^"']+)["']"#, key);
        Regex::new(&pattern)
            .ok()?
            .captures(payload)?
            .get(1)
            .map(|m| m.as_str().to_string())
    }

    fn extract_integer(payload: &str, key: &str) -> Option<i64> {
        let pattern = format!(r#"["']?\b{}["']?\s*:\s*["']?(\d+)"#, key);
        Regex::new(&pattern)
            .ok()?
            .captures(payload)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }

    UsageFields {
        result: extract_string(payload, "result"),
        msg: extract_string(payload, "msg"),
        userflow: extract_integer(payload, "userflow"),
        useflow: extract_integer(payload, "useflow"),
    }
}

/// Parse a usage response body into figures plus the gateway message
pub fn parse_usage_body(body: &str) -> Result<(UsageFigures, String), PayloadError> {
    let payload = strip_jsonp(body)?;
    tracing::debug!("Extracted usage payload: {}", payload);

    let fields = extract_usage_fields(payload);
    match fields {
        UsageFields {
            result: Some(ref result),
            userflow: Some(total_mb),
            useflow: Some(used_mb),
            ..
        } if result == "ok" => match UsageFigures::new(used_mb, total_mb) {
            Some(figures) => {
                let message = fields.msg.unwrap_or_else(|| "ok".to_string());
                Ok((figures, message))
            }
            None => {
                tracing::warn!(
                    "Usage figures out of range: userflow={}, useflow={}",
                    total_mb,
                    used_mb
                );
                Err(PayloadError::Rejected {
                    message: format!(
                        "usage figures out of range (userflow={total_mb}, useflow={used_mb})"
                    ),
                })
            }
        },
        _ => {
            tracing::warn!(
                "Unusable usage payload: result={:?}, userflow={:?}, useflow={:?}",
                fields.result,
                fields.userflow,
                fields.useflow
            );
            Err(PayloadError::Rejected {
                message: fields.msg.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string()),
            })
        }
    }
}
