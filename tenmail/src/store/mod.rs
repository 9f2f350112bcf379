//! In-memory session and message store.
//!
//! Sessions exclusively own their messages: deleting a session (explicitly,
//! lazily on access, or through the sweep) removes its messages as well.
//! Nothing here is persisted; a process restart starts empty.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{EmailSession, Message, NewMessage};

/// Session and message tables.
pub struct Store {
    clock: Arc<dyn Clock>,
    sessions: HashMap<Uuid, EmailSession>,
    /// Messages per session id, in insertion order.
    messages: HashMap<Uuid, Vec<Message>>,
}

impl Store {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sessions: HashMap::new(),
            messages: HashMap::new(),
        }
    }

    /// Current time as seen by this store.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // === Sessions ===

    /// Create and store a session for `email` valid until `expires_at`.
    pub fn create_session(&mut self, email: String, expires_at: DateTime<Utc>) -> EmailSession {
        let session = EmailSession::new(email, self.now(), expires_at);
        self.sessions.insert(session.id, session.clone());
        debug!(session_id = %session.id, email = %session.email, "session created");
        session
    }

    /// Look up a session. Does not check expiry.
    pub fn get_session(&self, id: Uuid) -> Option<EmailSession> {
        self.sessions.get(&id).cloned()
    }

    /// Find the session holding `email`.
    pub fn get_session_by_email(&self, email: &str) -> Option<EmailSession> {
        self.sessions.values().find(|s| s.email == email).cloned()
    }

    /// Move the expiry of an existing session.
    pub fn extend_session(&mut self, id: Uuid, expires_at: DateTime<Utc>) -> Option<EmailSession> {
        let session = self.sessions.get_mut(&id)?;
        session.expires_at = expires_at;
        Some(session.clone())
    }

    /// Remove a session and all of its messages. Absent ids are ignored.
    pub fn delete_session(&mut self, id: Uuid) {
        if self.sessions.remove(&id).is_some() {
            debug!(session_id = %id, "session deleted");
        }
        self.delete_messages(id);
    }

    /// Delete every session whose expiry is strictly before now.
    ///
    /// Returns the number of sessions removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.now();
        let expired: Vec<Uuid> = self
            .sessions
            .values()
            .filter(|s| s.expires_at < now)
            .map(|s| s.id)
            .collect();

        for id in &expired {
            self.delete_session(*id);
        }
        expired.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // === Messages ===

    /// Record a message for `session_id`. The session is not checked.
    pub fn create_message(&mut self, session_id: Uuid, new: NewMessage) -> Message {
        let message = Message::new(session_id, new, self.now());
        self.messages
            .entry(session_id)
            .or_default()
            .push(message.clone());
        message
    }

    /// Messages for a session, most recently received first.
    ///
    /// Messages with equal timestamps come out newest-inserted first.
    pub fn list_messages(&self, session_id: Uuid) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .messages
            .get(&session_id)
            .map(|m| m.iter().rev().cloned().collect())
            .unwrap_or_default();
        // Stable sort keeps the reversed insertion order for ties.
        messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        messages
    }

    pub fn get_message(&self, session_id: Uuid, message_id: Uuid) -> Option<Message> {
        self.messages
            .get(&session_id)?
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    pub fn delete_messages(&mut self, session_id: Uuid) {
        self.messages.remove(&session_id);
    }
}
