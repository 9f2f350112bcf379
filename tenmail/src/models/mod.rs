//! Data models for tenmail entities.

mod message;
mod provider;
mod session;

pub use message::{DedupKey, Message, NewMessage};
pub use provider::{ProviderMessageDetail, ProviderMessageSummary, NO_CONTENT};
pub use session::EmailSession;
