//! Account auto-selection
//!
//! Probes configured accounts in order and keeps the first one whose used
//! quota is under the threshold logged in. Accounts over the threshold are
//! logged out again before moving on.

use crate::http::Transport;
use crate::models::{Credentials, GatewaySettings, LoginOutcome};
use crate::portal::EPortal;
use serde::Serialize;

/// An account as the selector sees it
#[derive(Debug, Clone)]
pub struct Candidate {
    pub index: usize,
    pub name: String,
    pub credentials: Credentials,
}

/// How far probing an account got
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProbeStage {
    LoginFailed { message: String },
    QueryFailed { message: String },
    OverQuota { used_mb: i64 },
    Selected { used_mb: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountProbe {
    pub index: usize,
    pub name: String,
    pub username: String,
    #[serde(flatten)]
    pub stage: ProbeStage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionReport {
    pub probes: Vec<AccountProbe>,
    /// Logout issued after every candidate was rejected
    pub final_logout: Option<LoginOutcome>,
}

impl SelectionReport {
    /// The account left logged in, if any
    pub fn selected(&self) -> Option<&AccountProbe> {
        self.probes
            .iter()
            .find(|p| matches!(p.stage, ProbeStage::Selected { .. }))
    }
}

/// Settings for one auto-selection run
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    pub quota_threshold_mb: i64,
    pub logout_mac: String,
}

/// Try each candidate in turn; stop at the first one under the threshold
pub async fn auto_select<T: Transport>(
    portal: &EPortal<T>,
    settings: &GatewaySettings,
    candidates: &[Candidate],
    policy: &SelectionPolicy,
) -> SelectionReport {
    tracing::info!(
        "Checking data usage for {} account(s), threshold {} MB",
        candidates.len(),
        policy.quota_threshold_mb
    );

    let mut probes = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        tracing::info!(
            "Checking account {}: {} ({})",
            candidate.index,
            candidate.name,
            candidate.credentials.username
        );
        let stage = probe(portal, settings, candidate, policy).await;
        let selected = matches!(stage, ProbeStage::Selected { .. });

        probes.push(AccountProbe {
            index: candidate.index,
            name: candidate.name.clone(),
            username: candidate.credentials.username.clone(),
            stage,
        });

        if selected {
            return SelectionReport {
                probes,
                final_logout: None,
            };
        }
    }

    tracing::warn!(
        "No account under {} MB found, logging out",
        policy.quota_threshold_mb
    );
    let outcome = portal.logout(settings, &policy.logout_mac).await;
    if !outcome.success {
        tracing::warn!("Final logout failed: {}", outcome.message);
    }

    SelectionReport {
        probes,
        final_logout: Some(outcome),
    }
}

async fn probe<T: Transport>(
    portal: &EPortal<T>,
    settings: &GatewaySettings,
    candidate: &Candidate,
    policy: &SelectionPolicy,
) -> ProbeStage {
    let login = portal.login(&candidate.credentials, settings).await;
    if !login.success {
        tracing::warn!(
            "Login failed for account {}: {}, trying next account",
            candidate.index,
            login.message
        );
        return ProbeStage::LoginFailed {
            message: login.message,
        };
    }

    let usage = portal
        .query_data_usage(&candidate.credentials, settings)
        .await;
    let used_mb = match usage.raw_used_mb {
        Some(used_mb) if usage.success => used_mb,
        _ => {
            tracing::warn!(
                "Data usage query failed for account {}: {}, trying next account",
                candidate.index,
                usage.message
            );
            return ProbeStage::QueryFailed {
                message: usage.message,
            };
        }
    };

    tracing::info!("Account {} has used {} MB of data", candidate.index, used_mb);

    if used_mb < policy.quota_threshold_mb {
        ProbeStage::Selected { used_mb }
    } else {
        let logout = portal.logout(settings, &policy.logout_mac).await;
        if !logout.success {
            tracing::warn!(
                "Logout after over-quota account {} failed: {}",
                candidate.index,
                logout.message
            );
        }
        ProbeStage::OverQuota { used_mb }
    }
}
