//! CLI argument definitions.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, DEFAULT_PORT, DEFAULT_PROVIDER_URL};
use crate::provider::DEFAULT_DOMAINS;

/// Tenmail - disposable email addresses that live for ten minutes
#[derive(Parser, Debug)]
#[command(name = "tenmail")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve(ServeArgs),

    /// Generate a new temporary address
    Generate {
        #[command(flatten)]
        server: ServerArg,
    },

    /// Show a session and its remaining lifetime
    Show {
        /// Session ID
        id: String,

        #[command(flatten)]
        server: ServerArg,
    },

    /// List received messages
    Inbox {
        /// Session ID
        id: String,

        #[command(flatten)]
        server: ServerArg,
    },

    /// Check the provider for new mail
    Refresh {
        /// Session ID
        id: String,

        #[command(flatten)]
        server: ServerArg,
    },

    /// Give a session another full lifetime
    Extend {
        /// Session ID
        id: String,

        #[command(flatten)]
        server: ServerArg,
    },

    /// Delete a session and its messages
    Delete {
        /// Session ID
        id: String,

        #[command(flatten)]
        server: ServerArg,
    },
}

/// Where a running server can be reached.
#[derive(Args, Debug, Clone)]
pub struct ServerArg {
    /// Server base URL
    #[arg(long = "server", env = "TENMAIL_SERVER", default_value = "http://127.0.0.1:3000")]
    pub url: String,
}

/// Options for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "TENMAIL_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "TENMAIL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base URL of the mailbox provider API
    #[arg(long, env = "TENMAIL_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    /// How long address generation waits for the provider
    #[arg(long, env = "TENMAIL_GENERATE_TIMEOUT_MS", default_value_t = 100)]
    pub generate_timeout_ms: u64,

    /// Timeout for each provider request on the refresh path
    #[arg(long, env = "TENMAIL_PROVIDER_TIMEOUT_MS", default_value_t = 10_000)]
    pub provider_timeout_ms: u64,

    /// Seconds between expiry sweeps
    #[arg(long, env = "TENMAIL_SWEEP_INTERVAL_SECS", default_value_t = 30)]
    pub sweep_interval_secs: u64,

    /// Lifetime of a session in seconds
    #[arg(long, env = "TENMAIL_SESSION_TTL_SECS", default_value_t = 600)]
    pub session_ttl_secs: u32,

    /// Domains for locally generated addresses (comma-separated)
    #[arg(long, env = "TENMAIL_FALLBACK_DOMAINS", value_delimiter = ',')]
    pub fallback_domains: Vec<String>,
}

impl ServeArgs {
    /// Turn parsed flags into a server config.
    pub fn to_config(&self) -> Config {
        let fallback_domains = if self.fallback_domains.is_empty() {
            DEFAULT_DOMAINS.iter().map(ToString::to_string).collect()
        } else {
            self.fallback_domains.clone()
        };

        Config {
            bind: SocketAddr::new(self.host, self.port),
            provider_url: self.provider_url.clone(),
            generate_timeout: Duration::from_millis(self.generate_timeout_ms),
            provider_timeout: Duration::from_millis(self.provider_timeout_ms),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            session_ttl: chrono::Duration::seconds(i64::from(self.session_ttl_secs)),
            fallback_domains,
        }
    }
}
