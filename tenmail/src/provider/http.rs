//! HTTP client for 1secmail-compatible mailbox APIs.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{is_valid_address, split_address, synthesize_address, MailProvider, ProviderError};
use crate::models::{ProviderMessageDetail, ProviderMessageSummary};

/// Provider reached over HTTP.
///
/// All requests go to one base URL and are told apart by the `action`
/// query parameter.
pub struct HttpMailProvider {
    client: reqwest::Client,
    base_url: String,
    fallback_domains: Vec<String>,
}

impl HttpMailProvider {
    /// Create a provider client. `timeout` bounds every request.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        fallback_domains: Vec<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            fallback_domains,
        })
    }

    /// GET the base URL with `query` and parse the body as JSON.
    ///
    /// The body is read as text first; the provider sometimes answers with
    /// an HTML page and a 200 status.
    async fn get_json<T: DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let resp = self.client.get(&self.base_url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn try_generate(&self) -> Result<String, ProviderError> {
        let addresses: Vec<String> = self
            .get_json(&[("action", "genRandomMailbox"), ("count", "1")])
            .await?;

        addresses
            .into_iter()
            .map(|a| a.trim().to_string())
            .find(|a| is_valid_address(a))
            .ok_or(ProviderError::NoAddress)
    }

    async fn try_list(&self, address: &str) -> Result<Vec<ProviderMessageSummary>, ProviderError> {
        let (login, domain) = split_address(address)
            .ok_or_else(|| ProviderError::InvalidAddress(address.to_string()))?;

        self.get_json(&[
            ("action", "getMessages"),
            ("login", login),
            ("domain", domain),
        ])
        .await
    }

    async fn try_fetch(
        &self,
        address: &str,
        message_id: u64,
    ) -> Result<ProviderMessageDetail, ProviderError> {
        let (login, domain) = split_address(address)
            .ok_or_else(|| ProviderError::InvalidAddress(address.to_string()))?;
        let id = message_id.to_string();

        self.get_json(&[
            ("action", "readMessage"),
            ("login", login),
            ("domain", domain),
            ("id", id.as_str()),
        ])
        .await
    }
}

#[async_trait]
impl MailProvider for HttpMailProvider {
    async fn generate_address(&self) -> String {
        match self.try_generate().await {
            Ok(address) => {
                debug!(%address, "provider generated address");
                address
            }
            Err(e) => {
                warn!(error = %e, "address generation failed, using local fallback");
                synthesize_address(&self.fallback_domains)
            }
        }
    }

    async fn list_messages(&self, address: &str) -> Vec<ProviderMessageSummary> {
        self.try_list(address).await.unwrap_or_else(|e| {
            warn!(%address, error = %e, "listing messages failed");
            Vec::new()
        })
    }

    async fn fetch_message_content(
        &self,
        address: &str,
        message_id: u64,
    ) -> Option<ProviderMessageDetail> {
        match self.try_fetch(address, message_id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(%address, message_id, error = %e, "fetching message content failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::{Html, IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    const DOMAINS: &[&str] = &["fallback.test"];

    async fn healthy(Query(q): Query<HashMap<String, String>>) -> Response {
        match q.get("action").map(String::as_str) {
            Some("genRandomMailbox") => Json(json!(["fresh123@provider.test"])).into_response(),
            Some("getMessages") if q.get("login").map(String::as_str) == Some("box") => Json(
                json!([{"id": 7, "from": "a@x.test", "subject": "Hello", "date": "2024-01-01 10:00:00"}]),
            )
            .into_response(),
            Some("getMessages") => Json(json!([])).into_response(),
            Some("readMessage") if q.get("id").map(String::as_str) == Some("7") => Json(json!({
                "id": 7,
                "from": "a@x.test",
                "subject": "Hello",
                "date": "2024-01-01 10:00:00",
                "attachments": [],
                "body": "<p>Hi</p>",
                "textBody": "Hi",
                "htmlBody": "<p>Hi</p>"
            }))
            .into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn broken() -> Html<&'static str> {
        Html("<html><body>Service unavailable</body></html>")
    }

    async fn empty() -> Json<serde_json::Value> {
        Json(json!([]))
    }

    async fn spawn_stub(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn provider_for(app: Router) -> HttpMailProvider {
        let addr = spawn_stub(app).await;
        HttpMailProvider::new(
            format!("http://{addr}/api/v1/"),
            Duration::from_secs(5),
            DOMAINS.iter().map(ToString::to_string).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_healthy_provider() {
        let provider = provider_for(Router::new().route("/api/v1/", get(healthy))).await;

        assert_eq!(provider.generate_address().await, "fresh123@provider.test");

        let list = provider.list_messages("box@provider.test").await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 7);

        assert!(provider.list_messages("other@provider.test").await.is_empty());

        let detail = provider
            .fetch_message_content("box@provider.test", 7)
            .await
            .unwrap();
        assert_eq!(detail.text_content(), "Hi");
        assert!(provider
            .fetch_message_content("box@provider.test", 8)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_html_error_page_is_masked() {
        let provider = provider_for(Router::new().route("/api/v1/", get(broken))).await;

        let address = provider.generate_address().await;
        assert!(address.ends_with("@fallback.test"));
        assert!(provider.list_messages("box@provider.test").await.is_empty());
        assert!(provider
            .fetch_message_content("box@provider.test", 7)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_generate_result_falls_back() {
        let provider = provider_for(Router::new().route("/api/v1/", get(empty))).await;
        let address = provider.generate_address().await;
        assert!(is_valid_address(&address));
        assert!(address.ends_with("@fallback.test"));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = HttpMailProvider::new(
            format!("http://{addr}/api/v1/"),
            Duration::from_secs(2),
            Vec::new(),
        )
        .unwrap();

        assert!(is_valid_address(&provider.generate_address().await));
        assert!(provider.list_messages("box@provider.test").await.is_empty());
        assert!(provider.list_messages("not-an-address").await.is_empty());
    }
}
