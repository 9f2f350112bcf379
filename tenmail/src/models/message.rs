//! Message model representing mail received by a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message recorded locally for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier, assigned when recorded.
    pub id: Uuid,
    /// Session that owns this message.
    pub email_session_id: Uuid,
    /// Sender address as reported by the provider.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text_body: String,
    /// HTML body, if the provider had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    /// When the message was recorded locally (not the provider's date).
    pub received_at: DateTime<Utc>,
}

/// Fields needed to record a new message.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub from: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl Message {
    /// Build a message for `session_id` received at `received_at`.
    pub fn new(session_id: Uuid, new: NewMessage, received_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email_session_id: session_id,
            from: new.from,
            subject: new.subject,
            text_body: new.text_body,
            html_body: new.html_body,
            received_at,
        }
    }

    /// Key used to decide whether a provider message is already stored.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.from, &self.subject)
    }
}

/// Sender and subject pair identifying a message for dedup purposes.
///
/// Two distinct messages with the same sender and subject collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    from: String,
    subject: String,
}

impl DedupKey {
    pub fn new(from: &str, subject: &str) -> Self {
        Self {
            from: from.to_string(),
            subject: subject.to_string(),
        }
    }
}
