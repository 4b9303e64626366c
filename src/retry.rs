//! Bounded, fixed-delay retry for login attempts

use crate::models::{GatewaySettings, LoginOutcome};
use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self {
            enabled: settings.auto_retry,
            max_retries: settings.max_retries,
            delay: settings.retry_delay,
        }
    }

    /// Total attempts permitted, including the first one
    pub fn max_attempts(&self) -> u64 {
        if self.enabled {
            u64::from(self.max_retries) + 1
        } else {
            1
        }
    }
}

/// Run `attempt` until it succeeds or the policy is exhausted.
///
/// Sleeps `policy.delay` before every attempt after the first and returns the
/// last attempt's outcome unchanged.
pub async fn retry_login<F, Fut>(policy: RetryPolicy, mut attempt: F) -> LoginOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LoginOutcome>,
{
    let max_attempts = policy.max_attempts();
    let mut tries: u64 = 1;

    loop {
        let outcome = attempt().await;
        if outcome.success {
            return outcome;
        }

        let retryable = outcome.failure.map_or(true, |kind| kind.is_retryable());
        if tries >= max_attempts || !retryable {
            if max_attempts > 1 {
                tracing::warn!("Login failed after {} attempt(s): {}", tries, outcome.message);
            }
            return outcome;
        }

        tries += 1;
        tracing::info!(
            "{}, retrying login in {:?} (attempt {}/{})",
            outcome.message,
            policy.delay,
            tries,
            max_attempts
        );
        tokio::time::sleep(policy.delay).await;
    }
}
