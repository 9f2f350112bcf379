//! Tenmail - disposable email addresses with a ten minute lifetime.
//!
//! Architecture:
//! - The server keeps sessions and messages in memory
//! - An external mailbox provider hands out addresses and receives the mail
//! - Clients poll a refresh endpoint or subscribe over WebSocket for pushes
//! - The CLI can run the server or act as a thin client against one

mod cli;
mod clock;
mod config;
mod error;
mod models;
mod provider;
mod relay;
mod server;
mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenmail=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    execute(cli).await
}
