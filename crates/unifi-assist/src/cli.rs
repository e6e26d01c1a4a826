//! Clap derive structures for the `unifi-assist` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

use unifi_assist_api::{AuthStyle, ClientConfig};

use crate::logging::LogSettings;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// unifi-assist -- helper tools for the UniFi Network API
#[derive(Debug, Parser)]
#[command(
    name = "unifi-assist",
    version,
    about = "Helper tools for the UniFi Network API",
    long_about = "Talks to a UniFi Network controller through its Integration v1 API\n\
        and the legacy stat endpoints. Also hosts the pre-commit hook update check.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller host or URL (e.g. 192.168.1.1)
    #[arg(long, short = 'H', env = "UNIFI_HOST", global = true)]
    pub host: Option<String>,

    /// Integration API key
    #[arg(long, env = "UNIFI_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Send the key as `Authorization: Bearer` instead of `X-API-KEY`
    #[arg(long, global = true)]
    pub bearer: bool,

    /// Request timeout in seconds (no timeout when unset)
    #[arg(long, env = "UNIFI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write JSON and plain-text log files
    #[arg(long, global = true)]
    pub log_to_file: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs", global = true)]
    pub log_dir: PathBuf,
}

impl GlobalOpts {
    /// Logging settings; unset fields fall back to the environment.
    pub fn log_settings(&self) -> LogSettings {
        let level = match self.verbose {
            0 => None,
            1 => Some(Level::DEBUG),
            _ => Some(Level::TRACE),
        };

        LogSettings {
            name: "unifi_assist".into(),
            level,
            log_to_file: self.log_to_file.then_some(true),
            log_dir: self.log_dir.clone(),
        }
    }

    /// Client configuration from flags; the library fills the rest from env.
    pub fn client_config(&self) -> Result<ClientConfig, unifi_assist_api::Error> {
        let mut builder = ClientConfig::builder();

        if let Some(ref host) = self.host {
            builder = builder.host(host.clone());
        }
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key.clone());
        }
        if self.insecure {
            builder = builder.verify_ssl(false);
        }
        if self.bearer {
            builder = builder.auth_style(AuthStyle::Bearer);
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Walk through a few read-only calls and print the results
    Example(ExampleArgs),

    /// Save raw API responses as JSON fixtures
    Capture(CaptureArgs),

    /// Check (at most daily) whether pre-commit hooks have updates
    #[command(name = "check-hook-updates")]
    CheckHookUpdates(HookCheckArgs),
}

#[derive(Debug, Args)]
pub struct ExampleArgs {
    /// Site name for the legacy stat calls
    #[arg(long, short = 's', default_value = "default")]
    pub site: String,
}

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Directory the fixture files are written to
    #[arg(long, short = 'o', default_value = "fixtures/api_responses")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct HookCheckArgs {
    /// Cache file holding the last check time (defaults to the user cache dir)
    #[arg(long)]
    pub cache_file: Option<PathBuf>,
}
