//! Configuration management
//!
//! Settings come from a TOML file layered with `CAMPUS_LOGIN__*` environment
//! variables. The file holds the gateway location, retry behaviour and the
//! list of accounts available for login.

use crate::error::ConfigError;
use crate::models::{Credentials, GatewaySettings, DEFAULT_LOGOUT_MAC};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "CAMPUS_LOGIN";
const ENV_SEPARATOR: &str = "__";

/// Root configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Gateway endpoint and retry behaviour
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Accounts, addressed by their 0-based position
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Auto-selection settings
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Base host URL; the management port and portal path are appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Retry failed logins
    #[serde(default = "default_auto_retry")]
    pub auto_retry: bool,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before each retry in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auto_retry: default_auto_retry(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,

    /// Friendly name shown in listings
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Accounts that have used this many MB or more are skipped
    #[serde(default = "default_quota_threshold_mb")]
    pub quota_threshold_mb: i64,

    /// MAC sent with forced logouts
    #[serde(default = "default_logout_mac")]
    pub logout_mac: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            quota_threshold_mb: default_quota_threshold_mb(),
            logout_mac: default_logout_mac(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file path
    #[serde(default)]
    pub log_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: String::new(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://10.3.38.8/".to_string()
}

fn default_auto_retry() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_quota_threshold_mb() -> i64 {
    30_000
}

fn default_logout_mac() -> String {
    DEFAULT_LOGOUT_MAC.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One row of the account listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub index: usize,
    pub username: String,
    pub name: String,
}

impl Config {
    /// Candidate config files, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("campus-login.toml"),
            PathBuf::from("/etc/campus-login/config.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("campus-login/config.toml"));
        }
        paths
    }

    /// Load configuration from `explicit`, else the first existing search
    /// path, else defaults. Environment variables override file values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::search_paths().into_iter().find(|p| p.exists()),
        };

        let mut builder = config::Config::builder();
        match &path {
            Some(path) => {
                tracing::debug!("Loading config from: {}", path.display());
                builder = builder.add_source(
                    config::File::from(path.as_path())
                        .format(config::FileFormat::Toml)
                        .required(true),
                );
            }
            None => tracing::debug!("No config file found, using defaults"),
        }

        let cfg = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(cfg)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    /// Write a starter config to `path`. Never overwrites.
    pub fn write_template(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.display().to_string()));
        }

        let template = Self {
            accounts: vec![AccountConfig {
                username: "student1".to_string(),
                password: "password1".to_string(),
                name: "Student Account".to_string(),
            }],
            ..Self::default()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(&template)?)?;
        Ok(())
    }

    pub fn gateway_settings(&self) -> Result<GatewaySettings, ConfigError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        Ok(GatewaySettings {
            base_url: self.gateway.base_url.clone(),
            auto_retry: self.gateway.auto_retry,
            max_retries: self.gateway.max_retries,
            retry_delay: Duration::from_millis(self.gateway.retry_delay_ms),
        })
    }

    /// Credentials for the account at `index`, rejecting blank fields
    pub fn credentials(&self, index: usize) -> Result<Credentials, ConfigError> {
        let account = self
            .accounts
            .get(index)
            .ok_or(ConfigError::InvalidAccount {
                index,
                available: self.accounts.len(),
            })?;

        if account.username.trim().is_empty() || account.password.trim().is_empty() {
            return Err(ConfigError::MissingCredentials(index));
        }

        Ok(Credentials::new(&account.username, &account.password))
    }

    /// All configured accounts with display names filled in
    pub fn account_summaries(&self) -> Vec<AccountSummary> {
        self.accounts
            .iter()
            .enumerate()
            .map(|(index, account)| AccountSummary {
                index,
                username: account.username.clone(),
                name: if account.name.is_empty() {
                    format!("Account {}", index + 1)
                } else {
                    account.name.clone()
                },
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            accounts: Vec::new(),
            selection: SelectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [gateway]
        base_url = "http://10.0.0.1"
        max_retries = 5

        [[accounts]]
        username = "20230001"
        password = "pw1"
        name = "Dorm"

        [[accounts]]
        username = "20230002"
        password = ""

        [selection]
        quota_threshold_mb = 1024
    "#;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.gateway.base_url, "http://10.0.0.1");
        assert_eq!(cfg.gateway.max_retries, 5);
        assert!(cfg.gateway.auto_retry);
        assert_eq!(cfg.gateway.retry_delay_ms, 2000);
        assert_eq!(cfg.selection.quota_threshold_mb, 1024);
        assert_eq!(cfg.selection.logout_mac, "111111111111");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_gateway_settings() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        let settings = cfg.gateway_settings().unwrap();
        assert_eq!(settings.base_url, "http://10.0.0.1");
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.retry_delay, Duration::from_millis(2000));

        let mut blank = cfg.clone();
        blank.gateway.base_url = "  ".to_string();
        assert!(matches!(
            blank.gateway_settings(),
            Err(ConfigError::MissingBaseUrl)
        ));
    }

    #[test]
    fn test_credentials_selection() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            cfg.credentials(0).unwrap(),
            Credentials::new("20230001", "pw1")
        );
        assert!(matches!(
            cfg.credentials(1),
            Err(ConfigError::MissingCredentials(1))
        ));
        assert!(matches!(
            cfg.credentials(7),
            Err(ConfigError::InvalidAccount {
                index: 7,
                available: 2
            })
        ));
    }

    #[test]
    fn test_account_summaries_fallback_name() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        let summaries = cfg.account_summaries();
        assert_eq!(summaries[0].name, "Dorm");
        assert_eq!(summaries[1].name, "Account 2");
        assert_eq!(summaries[1].username, "20230002");
    }

    #[test]
    fn test_template_is_loadable_and_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        Config::write_template(&path).unwrap();
        let cfg = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.accounts.len(), 1);
        assert_eq!(cfg.credentials(0).unwrap().username, "student1");

        assert!(matches!(
            Config::write_template(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("absent.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
