//! Email session model representing a temporary address and its validity window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated temporary address plus the window during which it is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSession {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,
    /// The temporary address, `local@domain`.
    pub email: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl EmailSession {
    /// Create a new session stamped with `now`.
    pub fn new(email: String, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email,
            created_at,
            expires_at,
        }
    }

    /// Whether the session is expired as observed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
