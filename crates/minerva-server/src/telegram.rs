//! Telegram Bot API client and webhook payload types.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// An incoming webhook update. Only message updates are handled; every
/// other update kind deserializes with `message: None` and is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
}

/// Minimal Telegram Bot API client: send messages, show the typing
/// indicator, and register the webhook.
pub struct TelegramClient {
    token: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", TELEGRAM_API_BASE, self.token, method)
    }

    /// Send a text reply. Sent as Markdown first; if Telegram rejects
    /// the entities (model output is not always well-formed Markdown),
    /// the message is retried as plain text.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let markdown = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        match self.call("sendMessage", &markdown).await {
            Err(TelegramError::Api { status: 400, .. }) => {
                debug!(chat_id, "Markdown rejected, retrying as plain text");
                let plain = json!({ "chat_id": chat_id, "text": text });
                self.call("sendMessage", &plain).await
            }
            other => other,
        }
    }

    /// Show the "typing…" indicator while a turn is being processed.
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TelegramError> {
        self.call(
            "sendChatAction",
            &json!({ "chat_id": chat_id, "action": action }),
        )
        .await
    }

    /// Point the bot's webhook at this deployment.
    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        self.call("setWebhook", &json!({ "url": url })).await
    }

    async fn call(&self, method: &str, payload: &serde_json::Value) -> Result<(), TelegramError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
