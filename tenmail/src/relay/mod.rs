//! Live-update relay.
//!
//! Maps a session id to at most one open connection. The last subscriber for
//! a session wins. Notifications are fire-and-forget: when nothing is
//! registered, or the registered connection has gone away, the event is
//! dropped. There is no queueing and no retry.

mod socket;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

pub use socket::handle_socket;

/// Identifies one duplex connection.
pub type ConnectionId = u64;

/// Event pushed from the server to a subscribed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    NewMessages { count: usize },
}

/// Frame sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
}

/// Sending half of a registered connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<RelayEvent>,
}

impl Connection {
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Registry of live connections keyed by session id.
#[derive(Default)]
pub struct Relay {
    next_id: AtomicU64,
    connections: Mutex<HashMap<Uuid, Connection>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a connection and the receiver its socket task drains.
    pub fn open_connection(&self) -> (Connection, mpsc::UnboundedReceiver<RelayEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection { id, tx }, rx)
    }

    /// Register `connection` for `session_id`, replacing any previous one.
    pub async fn subscribe(&self, session_id: Uuid, connection: Connection) {
        debug!(%session_id, connection_id = connection.id, "relay subscribe");
        self.connections.lock().await.insert(session_id, connection);
    }

    /// Drop every registration held by `connection_id`.
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        self.connections
            .lock()
            .await
            .retain(|_, conn| conn.id != connection_id);
    }

    /// Push a new-messages event to the session's connection, if any.
    pub async fn notify(&self, session_id: Uuid, count: usize) {
        let connections = self.connections.lock().await;
        let Some(conn) = connections.get(&session_id) else {
            debug!(%session_id, "no subscriber, dropping notification");
            return;
        };

        if !conn.is_open() {
            debug!(%session_id, connection_id = conn.id, "subscriber closed, dropping notification");
            return;
        }

        if conn.tx.send(RelayEvent::NewMessages { count }).is_err() {
            debug!(%session_id, connection_id = conn.id, "notification dropped");
        }
    }

    #[cfg(test)]
    pub async fn is_subscribed(&self, session_id: Uuid) -> bool {
        self.connections.lock().await.contains_key(&session_id)
    }
}
