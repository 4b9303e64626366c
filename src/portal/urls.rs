//! ePortal endpoint URLs
//!
//! Every endpoint lives on the management port of the configured base host:
//! `<base>:801/eportal/?c=<controller>&a=<action>...`

use rand::Rng;

const MANAGEMENT_PORT: u16 = 801;

/// Base URL with at most one trailing slash removed
pub fn normalize_base(base_url: &str) -> &str {
    base_url.strip_suffix('/').unwrap_or(base_url)
}

fn endpoint(base_url: &str, query: &str) -> String {
    format!(
        "{}:{}/eportal/?{}",
        normalize_base(base_url),
        MANAGEMENT_PORT,
        query
    )
}

pub fn login_url(base_url: &str) -> String {
    endpoint(base_url, "c=ACSetting&a=Login")
}

pub fn logout_url(base_url: &str, mac: &str) -> String {
    endpoint(
        base_url,
        &format!(
            "c=ACSetting&a=Logout&ver=1.0&wlanusermac={}",
            urlencoding::encode(mac)
        ),
    )
}

pub fn usage_url(base_url: &str, account: &str, callback: &str, timestamp_ms: i64) -> String {
    endpoint(
        base_url,
        &format!(
            "c=ServiceInterface&a=loadUserFlow&callback={}&account={}&_={}",
            callback,
            urlencoding::encode(account),
            timestamp_ms
        ),
    )
}

/// jQuery-style JSONP callback name, unique per call so caches never match
pub fn jsonp_callback(timestamp_ms: i64) -> String {
    let token: u64 = rand::thread_rng().gen_range(100_000_000_000_000..1_000_000_000_000_000);
    format!("jQuery{}_{}", token, timestamp_ms)
}
