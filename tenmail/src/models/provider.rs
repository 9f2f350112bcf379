//! Message shapes reported by the external mailbox provider.

use serde::{Deserialize, Serialize};

/// One entry of a provider mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessageSummary {
    pub id: u64,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub date: String,
}

/// Full content of one provider message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMessageDetail {
    pub id: u64,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub text_body: Option<String>,
    #[serde(default)]
    pub html_body: Option<String>,
}

/// Text used when neither a text body nor an alternate body is available.
pub const NO_CONTENT: &str = "No content";

impl ProviderMessageDetail {
    /// Plain text content, falling back to the alternate body, then a placeholder.
    pub fn text_content(&self) -> String {
        [self.text_body.as_deref(), self.body.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(NO_CONTENT)
            .to_string()
    }

    /// HTML body, treating an empty string as absent.
    pub fn html_content(&self) -> Option<String> {
        self.html_body.clone().filter(|s| !s.is_empty())
    }
}
