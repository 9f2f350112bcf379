//! Tenmail server - temporary addresses over a JSON API.
//!
//! Architecture:
//! - One in-memory store holds sessions and their messages
//! - Address generation and mail delivery are delegated to an external provider
//! - Expired sessions are removed lazily on access and by a periodic sweep
//! - Refreshes that find new mail are pushed to a subscribed WebSocket
//!
//! Endpoints:
//! - POST /api/email/generate - Create a session with a new address
//! - GET /api/email/:id - Get a session
//! - DELETE /api/email/:id - Delete a session and its messages
//! - POST /api/email/:id/extend - Push the session's expiry forward
//! - GET /api/email/:id/messages - List messages, newest first
//! - GET /api/email/:id/messages/:message_id - Get one message
//! - POST /api/email/:id/refresh - Pull new mail from the provider
//! - WS /ws - Live new-message notifications
//! - GET /health - Liveness

mod handlers;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{panic_response, ApiError, ApiResult};
use crate::models::{DedupKey, EmailSession, Message, NewMessage, NO_CONTENT};
use crate::provider::{synthesize_address, HttpMailProvider, MailProvider};
use crate::relay::Relay;
use crate::store::Store;

/// Shared server state.
pub struct AppState {
    config: Config,
    clock: Arc<dyn Clock>,
    /// Sessions and messages.
    store: RwLock<Store>,
    /// External mailbox provider.
    provider: Arc<dyn MailProvider>,
    /// Live connections waiting for refresh events.
    relay: Arc<Relay>,
}

/// Result of a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub messages: Vec<Message>,
    pub new_count: usize,
}

impl AppState {
    pub fn new(config: Config, clock: Arc<dyn Clock>, provider: Arc<dyn MailProvider>) -> Self {
        Self {
            store: RwLock::new(Store::new(clock.clone())),
            config,
            clock,
            provider,
            relay: Arc::new(Relay::new()),
        }
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Create a session for a fresh address.
    ///
    /// The provider gets `generate_timeout` to answer; after that a local
    /// address is used so the caller is never held up by a slow provider.
    pub async fn generate_session(&self) -> EmailSession {
        let email = match tokio::time::timeout(
            self.config.generate_timeout,
            self.provider.generate_address(),
        )
        .await
        {
            Ok(email) => email,
            Err(_) => {
                debug!("provider too slow, using local address");
                synthesize_address(&self.config.fallback_domains)
            }
        };

        let mut store = self.store.write().await;
        let email = if store.get_session_by_email(&email).is_some() {
            debug!(%email, "address already in use, using local address");
            synthesize_address(&self.config.fallback_domains)
        } else {
            email
        };
        let expires_at = self.clock.now() + self.config.session_ttl;
        let session = store.create_session(email, expires_at);
        drop(store);
        info!(session_id = %session.id, email = %session.email, "generated address");
        session
    }

    /// Look up a session that has not expired.
    ///
    /// An expired session is deleted on the spot and reported as
    /// [`ApiError::Expired`]; later lookups see it as unknown.
    pub async fn active_session(&self, id: Uuid) -> ApiResult<EmailSession> {
        check_active(&mut *self.store.write().await, id)
    }

    pub async fn list_messages(&self, id: Uuid) -> ApiResult<Vec<Message>> {
        let mut store = self.store.write().await;
        check_active(&mut store, id)?;
        Ok(store.list_messages(id))
    }

    pub async fn get_message(&self, id: Uuid, message_id: Uuid) -> ApiResult<Message> {
        let mut store = self.store.write().await;
        check_active(&mut store, id)?;
        store
            .get_message(id, message_id)
            .ok_or(ApiError::MessageNotFound)
    }

    /// Give an active session a full lifetime again, counted from now.
    pub async fn extend_session(&self, id: Uuid) -> ApiResult<EmailSession> {
        let mut store = self.store.write().await;
        check_active(&mut store, id)?;
        let expires_at = self.clock.now() + self.config.session_ttl;
        store
            .extend_session(id, expires_at)
            .ok_or(ApiError::NotFound)
    }

    /// Delete a session outright, expired or not.
    pub async fn delete_session(&self, id: Uuid) -> ApiResult<()> {
        let mut store = self.store.write().await;
        if store.get_session(id).is_none() {
            return Err(ApiError::NotFound);
        }
        store.delete_session(id);
        Ok(())
    }

    /// Pull the provider's mailbox and record messages not seen before.
    ///
    /// A provider message counts as already stored when a stored message has
    /// the same sender and subject. No lock is held while the provider is
    /// being called.
    pub async fn refresh(&self, id: Uuid) -> ApiResult<RefreshResponse> {
        let session = self.active_session(id).await?;
        let summaries = self.provider.list_messages(&session.email).await;

        let mut seen: HashSet<DedupKey> = self
            .store
            .read()
            .await
            .list_messages(id)
            .iter()
            .map(Message::dedup_key)
            .collect();

        let mut fetched = Vec::new();
        for summary in summaries {
            let key = DedupKey::new(&summary.from, &summary.subject);
            if !seen.insert(key.clone()) {
                continue;
            }

            let detail = self
                .provider
                .fetch_message_content(&session.email, summary.id)
                .await;
            let (text_body, html_body) = detail.map_or_else(
                || (NO_CONTENT.to_string(), None),
                |d| (d.text_content(), d.html_content()),
            );

            fetched.push((
                key,
                NewMessage {
                    from: summary.from,
                    subject: summary.subject,
                    text_body,
                    html_body,
                },
            ));
        }

        let (messages, new_count) = {
            let mut store = self.store.write().await;

            // The session may be gone or past its expiry once the provider returns.
            if store.get_session(id).is_none() {
                return Err(if session.is_expired_at(store.now()) {
                    ApiError::Expired
                } else {
                    ApiError::NotFound
                });
            }
            check_active(&mut store, id)?;

            // Re-check against what a concurrent refresh may have stored.
            let stored: HashSet<DedupKey> = store
                .list_messages(id)
                .iter()
                .map(Message::dedup_key)
                .collect();

            let mut new_count = 0;
            for (key, new) in fetched {
                if stored.contains(&key) {
                    continue;
                }
                store.create_message(id, new);
                new_count += 1;
            }
            (store.list_messages(id), new_count)
        };

        if new_count > 0 {
            info!(session_id = %id, new_count, "new messages");
            self.relay.notify(id, new_count).await;
        }

        Ok(RefreshResponse {
            messages,
            new_count,
        })
    }

    /// Remove every session past its expiry.
    pub async fn sweep(&self) -> usize {
        self.store.write().await.sweep_expired()
    }

    pub async fn session_count(&self) -> usize {
        self.store.read().await.session_count()
    }
}

/// Expiry check shared by every session access. Runs under the caller's guard
/// so the check and whatever follows it see the same store.
fn check_active(store: &mut Store, id: Uuid) -> ApiResult<EmailSession> {
    let session = store.get_session(id).ok_or(ApiError::NotFound)?;

    if session.is_expired_at(store.now()) {
        store.delete_session(id);
        info!(session_id = %id, "session expired");
        return Err(ApiError::Expired);
    }
    Ok(session)
}

// === Server Lifecycle ===

/// Build the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/email/generate", post(handlers::generate))
        .route(
            "/api/email/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/email/{session_id}/extend", post(handlers::extend))
        .route("/api/email/{session_id}/messages", get(handlers::list_messages))
        .route(
            "/api/email/{session_id}/messages/{message_id}",
            get(handlers::get_message),
        )
        .route("/api/email/{session_id}/refresh", post(handlers::refresh))
        .route("/ws", get(handlers::websocket_handler))
        .route("/health", get(handlers::health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .with_state(state)
}

/// Run the expiry sweep every `sweep_interval` until the task is aborted.
pub fn spawn_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.sweep().await;
            if removed > 0 {
                info!(removed, "swept expired sessions");
            }
        }
    })
}

/// Start the server and run until ctrl-c.
pub async fn start_server(config: Config) -> Result<()> {
    let provider = HttpMailProvider::new(
        config.provider_url.clone(),
        config.provider_timeout,
        config.fallback_domains.clone(),
    )
    .context("Failed to build provider client")?;

    let addr = config.bind;
    let state = Arc::new(AppState::new(
        config,
        Arc::new(SystemClock),
        Arc::new(provider),
    ));

    let sweeper = spawn_sweeper(state.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Tenmail server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Tenmail server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
