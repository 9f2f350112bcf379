//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::provider::DEFAULT_DOMAINS;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;
/// 1secmail-compatible API root.
pub const DEFAULT_PROVIDER_URL: &str = "https://www.1secmail.com/api/v1/";

/// Runtime settings for the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind.
    pub bind: SocketAddr,
    /// Base URL of the mailbox provider.
    pub provider_url: String,
    /// How long address generation waits for the provider before falling back.
    pub generate_timeout: Duration,
    /// Per-request timeout for provider calls on the refresh path.
    pub provider_timeout: Duration,
    /// Interval between expiry sweeps.
    pub sweep_interval: Duration,
    /// Lifetime of a new (or extended) session.
    pub session_ttl: chrono::Duration,
    /// Domains used for locally synthesized addresses.
    pub fallback_domains: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            generate_timeout: Duration::from_millis(100),
            provider_timeout: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(30),
            session_ttl: chrono::Duration::minutes(10),
            fallback_domains: DEFAULT_DOMAINS.iter().map(ToString::to_string).collect(),
        }
    }
}
