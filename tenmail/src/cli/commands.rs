//! CLI command execution.
//!
//! Everything except `serve` is a thin client that talks to a running
//! server over HTTP.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::models::{EmailSession, Message};
use crate::server::{self, RefreshResponse};

use super::args::{Cli, Commands};

/// Execute the parsed CLI.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => server::start_server(args.to_config()).await,
        Commands::Generate { server } => cmd_generate(&server.url).await,
        Commands::Show { id, server } => cmd_show(&server.url, &id).await,
        Commands::Inbox { id, server } => cmd_inbox(&server.url, &id).await,
        Commands::Refresh { id, server } => cmd_refresh(&server.url, &id).await,
        Commands::Extend { id, server } => cmd_extend(&server.url, &id).await,
        Commands::Delete { id, server } => cmd_delete(&server.url, &id).await,
    }
}

/// Map a server status to an error, if it is one.
fn check_status(status: StatusCode) -> Result<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => bail!("Session not found"),
        StatusCode::GONE => bail!("Session has expired"),
        s => bail!("Server returned {s}"),
    }
}

/// Send a request and parse the JSON response.
async fn send_json<T: DeserializeOwned>(req: RequestBuilder, what: &str) -> Result<T> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("Failed to {what}. Is the server running?"))?;
    check_status(resp.status())?;
    resp.json().await.context("Failed to parse response")
}

fn session_url(base: &str, id: &str) -> String {
    format!("{}/api/email/{id}", base.trim_end_matches('/'))
}

fn print_session(session: &EmailSession) {
    let remaining = session.expires_at - Utc::now();
    println!("Address:  {}", session.email);
    println!("Session:  {}", session.id);
    if remaining.num_seconds() > 0 {
        println!(
            "Expires:  {} ({}m {:02}s left)",
            session.expires_at.format("%H:%M:%S"),
            remaining.num_minutes(),
            remaining.num_seconds() % 60
        );
    } else {
        println!("Expires:  {} (expired)", session.expires_at.format("%H:%M:%S"));
    }
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("No messages yet.");
        return;
    }

    for msg in messages {
        println!(
            "{}  {:<30}  {}",
            msg.received_at.format("%H:%M:%S"),
            msg.from,
            msg.subject
        );
    }
}

async fn cmd_generate(base: &str) -> Result<()> {
    let url = format!("{}/api/email/generate", base.trim_end_matches('/'));
    let session: EmailSession =
        send_json(reqwest::Client::new().post(&url), "generate an address").await?;
    print_session(&session);
    Ok(())
}

async fn cmd_show(base: &str, id: &str) -> Result<()> {
    let session: EmailSession = send_json(
        reqwest::Client::new().get(session_url(base, id)),
        "get session",
    )
    .await?;
    print_session(&session);
    Ok(())
}

async fn cmd_inbox(base: &str, id: &str) -> Result<()> {
    let url = format!("{}/messages", session_url(base, id));
    let messages: Vec<Message> =
        send_json(reqwest::Client::new().get(&url), "list messages").await?;
    print_messages(&messages);
    Ok(())
}

async fn cmd_refresh(base: &str, id: &str) -> Result<()> {
    let url = format!("{}/refresh", session_url(base, id));
    let response: RefreshResponse =
        send_json(reqwest::Client::new().post(&url), "refresh").await?;

    match response.new_count {
        0 => println!("No new messages."),
        1 => println!("1 new message."),
        n => println!("{n} new messages."),
    }
    print_messages(&response.messages);
    Ok(())
}

async fn cmd_extend(base: &str, id: &str) -> Result<()> {
    let url = format!("{}/extend", session_url(base, id));
    let session: EmailSession =
        send_json(reqwest::Client::new().post(&url), "extend session").await?;
    print_session(&session);
    Ok(())
}

async fn cmd_delete(base: &str, id: &str) -> Result<()> {
    let resp = reqwest::Client::new()
        .delete(session_url(base, id))
        .send()
        .await
        .context("Failed to delete session. Is the server running?")?;
    check_status(resp.status())?;
    println!("Deleted {id}");
    Ok(())
}
