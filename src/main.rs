//! campus-login - Campus network auto sign-in
//!
//! Logs in to the campus gateway, forces logouts and reports data usage for
//! the accounts listed in the config file.

use anyhow::{bail, Context, Result};
use campus_login::config::{Config, LoggingConfig};
use campus_login::selection::{self, Candidate, ProbeStage, SelectionPolicy};
use campus_login::{EPortal, HttpClient, LoginOutcome, UsageOutcome};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "campus-login")]
#[command(about = "Campus Network Auto Sign-In", long_about = None)]
struct Args {
    /// Config file path (default: search campus-login.toml, /etc, ~/.config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with one account
    Login {
        /// Account index (0-based)
        #[arg(short, long, default_value_t = 0)]
        account: usize,
    },
    /// Force-logout a device by MAC address
    Logout {
        /// MAC address (default: selection.logout_mac)
        #[arg(short, long)]
        mac: Option<String>,
    },
    /// Log in, then show data usage for one account
    Usage {
        /// Account index (0-based)
        #[arg(short, long, default_value_t = 0)]
        account: usize,
    },
    /// Log in with the first account under the quota threshold
    AutoSelect {
        /// Override selection.quota_threshold_mb
        #[arg(short, long)]
        threshold_mb: Option<i64>,
    },
    /// List configured accounts
    Accounts,
    /// Show the effective configuration
    ShowConfig,
    /// Write a starter config file
    InitConfig {
        /// Destination (default: ~/.config/campus-login/config.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let cfg = Config::load(args.config.as_deref())?;

    // Initialize logging
    init_logging(&cfg.logging)?;

    tracing::info!("campus-login v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Login { account } => run_login(&cfg, account, args.json).await,
        Command::Logout { mac } => run_logout(&cfg, mac, args.json).await,
        Command::Usage { account } => run_usage(&cfg, account, args.json).await,
        Command::AutoSelect { threshold_mb } => run_auto_select(&cfg, threshold_mb, args.json).await,
        Command::Accounts => {
            list_accounts(&cfg);
            Ok(())
        }
        Command::ShowConfig => {
            show_config(&cfg);
            Ok(())
        }
        Command::InitConfig { path } => init_config(path),
    }
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.log_file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.log_file)
            .with_context(|| format!("Failed to open log file {}", logging.log_file))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => dirs::config_dir()
            .map(|d| d.join("campus-login/config.toml"))
            .context("Could not determine the user config directory")?,
    };
    Config::write_template(&path)?;
    println!("Wrote config template to {}", path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_login(cfg: &Config, account: usize, json: bool) -> Result<()> {
    let settings = cfg.gateway_settings()?;
    let creds = cfg.credentials(account)?;
    let portal = EPortal::new(HttpClient::new()?);

    tracing::info!("Using account at index {} for login", account);
    let outcome = portal.login(&creds, &settings).await;

    if json {
        print_json(&outcome)?;
    } else if outcome.success {
        println!(
            "Successfully logged in to campus network with account: {}",
            creds.username
        );
    } else {
        println!("Failed to log in: {}", outcome.message);
    }
    ensure_success(&outcome)
}

async fn run_logout(cfg: &Config, mac: Option<String>, json: bool) -> Result<()> {
    let settings = cfg.gateway_settings()?;
    let mac = mac.unwrap_or_else(|| cfg.selection.logout_mac.clone());
    let portal = EPortal::new(HttpClient::new()?);

    let outcome = portal.logout(&settings, &mac).await;

    if json {
        print_json(&outcome)?;
    } else if outcome.success {
        println!("Successfully logged out device with MAC {mac} from campus network");
    } else {
        println!("Failed to log out device: {}", outcome.message);
    }
    ensure_success(&outcome)
}

async fn run_usage(cfg: &Config, account: usize, json: bool) -> Result<()> {
    let settings = cfg.gateway_settings()?;
    let creds = cfg.credentials(account)?;
    let portal = EPortal::new(HttpClient::new()?);

    // the usage endpoint only answers for a logged-in session
    tracing::info!("Logging in before querying data usage");
    let login = portal.login(&creds, &settings).await;
    if !login.success {
        if json {
            print_json(&login)?;
        } else {
            println!("Failed to log in: {}", login.message);
        }
        return ensure_success(&login);
    }

    let usage = portal.query_data_usage(&creds, &settings).await;

    if json {
        print_json(&usage)?;
    } else if usage.success {
        println!("Data usage for account: {}", creds.username);
        print_usage(&usage);
    } else {
        println!("Failed to query data usage: {}", usage.message);
    }

    if !usage.success {
        bail!("{}", usage.message);
    }
    Ok(())
}

fn print_usage(usage: &UsageOutcome) {
    fn line(label: &str, raw: Option<i64>, mb: Option<f64>, bytes: Option<i64>) {
        if let Some(raw) = raw {
            println!("{label} (raw): {raw} MB");
        }
        match (mb, bytes) {
            (Some(mb), _) => println!("{label}: {mb:.2} MB"),
            (None, Some(bytes)) => println!("{label}: {bytes} bytes"),
            (None, None) => println!("{label}: Not available"),
        }
    }

    line("Used data", usage.raw_used_mb, usage.used_mb, usage.used_bytes);
    line("Total data", usage.raw_total_mb, usage.total_mb, usage.total_bytes);
    line("Remaining data", None, usage.remaining_mb, usage.remaining_bytes);
}

async fn run_auto_select(cfg: &Config, threshold_mb: Option<i64>, json: bool) -> Result<()> {
    let settings = cfg.gateway_settings()?;
    let policy = SelectionPolicy {
        quota_threshold_mb: threshold_mb.unwrap_or(cfg.selection.quota_threshold_mb),
        logout_mac: cfg.selection.logout_mac.clone(),
    };

    let candidates: Vec<Candidate> = cfg
        .account_summaries()
        .into_iter()
        .filter_map(|summary| match cfg.credentials(summary.index) {
            Ok(credentials) => Some(Candidate {
                index: summary.index,
                name: summary.name,
                credentials,
            }),
            Err(e) => {
                tracing::warn!("Skipping account {}: {}", summary.index, e);
                None
            }
        })
        .collect();

    if candidates.is_empty() {
        bail!(campus_login::ConfigError::NoAccounts);
    }

    let portal = EPortal::new(HttpClient::new()?);
    let report = selection::auto_select(&portal, &settings, &candidates, &policy).await;

    if json {
        print_json(&report)?;
    }

    match report.selected() {
        Some(probe) => {
            if !json {
                println!(
                    "Successfully logged in with account: {} ({})",
                    probe.name, probe.username
                );
                if let ProbeStage::Selected { used_mb } = probe.stage {
                    println!(
                        "Data usage: {} MB (less than {} MB)",
                        used_mb, policy.quota_threshold_mb
                    );
                }
            }
            Ok(())
        }
        None => {
            if !json {
                println!(
                    "No account with data usage under {} MB",
                    policy.quota_threshold_mb
                );
            }
            bail!("no suitable account found")
        }
    }
}

fn list_accounts(cfg: &Config) {
    let accounts = cfg.account_summaries();
    if accounts.is_empty() {
        println!("No accounts configured.");
        return;
    }

    println!("Available accounts:");
    for account in accounts {
        println!(
            "{}. {} (username: {})",
            account.index, account.name, account.username
        );
    }
}

fn show_config(cfg: &Config) {
    println!("Gateway:");
    println!("  Base URL: {}", cfg.gateway.base_url);
    println!("  Auto Retry: {}", cfg.gateway.auto_retry);
    println!("  Max Retries: {}", cfg.gateway.max_retries);
    println!("  Retry Delay: {}ms", cfg.gateway.retry_delay_ms);
    println!("Selection:");
    println!("  Quota threshold: {} MB", cfg.selection.quota_threshold_mb);
    println!("  Logout MAC: {}", cfg.selection.logout_mac);
    println!("Accounts:");
    for (summary, account) in cfg.account_summaries().iter().zip(&cfg.accounts) {
        let password = if account.password.is_empty() {
            "(not set)"
        } else {
            "********"
        };
        println!(
            "  {}. {} (username: {}, password: {})",
            summary.index, summary.name, summary.username, password
        );
    }
}

fn ensure_success(outcome: &LoginOutcome) -> Result<()> {
    if outcome.success {
        Ok(())
    } else {
        bail!("{}", outcome.message)
    }
}
