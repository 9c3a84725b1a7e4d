//! Bot notifications sent after every answer.
//!
//! Delivery is best effort: a failed notification is logged by the caller
//! and never aborts a run.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BotSecrets;
use crate::error::{Result, SherwoodError};
use crate::llm::BackendId;
use crate::template::ProductKind;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Text sent when `backend` has answered a `kind` request about `key_phrase`
pub fn format_message(backend: BackendId, kind: ProductKind, key_phrase: &str) -> String {
    format!(
        "Sherwood Generator\n{}\n{}\n{}",
        backend.name(),
        kind.label(),
        key_phrase
    )
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Drops every message
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Sends messages to one chat through the Telegram Bot API
pub struct TelegramNotifier {
    endpoint: String,
    chat_id: String,
    http_client: HttpClient,
}

impl TelegramNotifier {
    pub fn new(secrets: &BotSecrets) -> Result<Self> {
        let http_client = HttpClient::builder()
            .user_agent(concat!("sherwood/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SherwoodError::InvalidConfig {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self::with_base_url(TELEGRAM_API_URL, secrets, http_client))
    }

    pub fn with_base_url(base_url: &str, secrets: &BotSecrets, http_client: HttpClient) -> Self {
        Self {
            endpoint: format!(
                "{}/bot{}/sendMessage",
                base_url.trim_end_matches('/'),
                secrets.token
            ),
            chat_id: secrets.recipient_id.clone(),
            http_client,
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct BotReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
            })
            .send()
            .await
            .map_err(|e| SherwoodError::Notification {
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("sendMessage status: {}", status);

        let reply: Option<BotReply> = serde_json::from_str(&body).ok();
        match reply {
            Some(BotReply { ok: true, .. }) if status.is_success() => Ok(()),
            Some(BotReply { description, .. }) => Err(SherwoodError::Notification {
                message: description.unwrap_or_else(|| format!("status {}", status)),
            }),
            None => Err(SherwoodError::Notification {
                message: format!("status {}", status),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn secrets() -> BotSecrets {
        BotSecrets {
            token: "123:abc".to_string(),
            recipient_id: "42".to_string(),
        }
    }

    #[test]
    fn message_names_backend_product_and_phrase() {
        assert_eq!(
            format_message(BackendId::Graham, ProductKind::TariffResponse, "Vietnam"),
            "Sherwood Generator\nGraham\nResponse to US Reciprocal Tariffs\nVietnam"
        );
        assert_eq!(
            format_message(BackendId::Sonar, ProductKind::Biography, "Jane Doe"),
            "Sherwood Generator\nSonar\nCV\nJane Doe"
        );
    }

    #[tokio::test]
    async fn sends_to_recipient() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::Json(serde_json::json!({
                "chat_id": "42",
                "text": "hello"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .create_async()
            .await;

        let notifier = TelegramNotifier::with_base_url(&server.url(), &secrets(), HttpClient::new());
        notifier.notify("hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_message_is_notification_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let notifier = TelegramNotifier::with_base_url(&server.url(), &secrets(), HttpClient::new());
        let err = notifier.notify("hello").await.unwrap_err();
        match err {
            SherwoodError::Notification { message } => assert!(message.contains("chat not found")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn noop_accepts_everything() {
        assert!(NoopNotifier.notify("anything").await.is_ok());
    }
}
