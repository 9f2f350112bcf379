//! Mail provider adapter.
//!
//! The external provider owns mailbox generation and mail delivery. It is
//! unreliable: it can be slow, down, or answer with an HTML error page. Every
//! method on [`MailProvider`] treats that as an expected outcome and returns
//! a safe default instead of an error.

mod fallback;
mod http;

use async_trait::async_trait;

use crate::models::{ProviderMessageDetail, ProviderMessageSummary};

pub use fallback::{is_valid_address, split_address, synthesize_address, DEFAULT_DOMAINS};
pub use http::HttpMailProvider;

/// Errors raised inside the adapter. They never leave it.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("provider returned a non-JSON body: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("provider returned no usable address")]
    NoAddress,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Source of temporary addresses and their mail.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// A new address. Falls back to a locally synthesized one.
    async fn generate_address(&self) -> String;

    /// Messages currently in the mailbox for `address`. Empty on failure.
    async fn list_messages(&self, address: &str) -> Vec<ProviderMessageSummary>;

    /// Full content of one message. `None` on failure.
    async fn fetch_message_content(
        &self,
        address: &str,
        message_id: u64,
    ) -> Option<ProviderMessageDetail>;
}
