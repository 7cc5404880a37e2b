//! HTTP routes: the Telegram webhook and the generic chat endpoint.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use minerva_ai::{History, InlineData, Orchestrator};

use crate::error::ServerError;
use crate::history::HistoryStore;
use crate::telegram::{TelegramClient, Update};

const GREETING: &str = "Hello! I'm your AI assistant. Send me a message to get started.";
const CLEARED: &str = "Conversation history cleared.";
const SERVER_ERROR_REPLY: &str = "Sorry, a server error occurred. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn HistoryStore>,
    pub telegram: Option<Arc<TelegramClient>>,
}

/// Inline image payloads arrive base64-encoded in the request body, so
/// the default limit is far too small.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/telegram-webhook", post(telegram_webhook))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Request body for the generic endpoint. Field names match the wire
/// format clients already use (`imageData`, `mimeType`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub history: Option<History>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub updated_history: History,
}

/// Generic endpoint: one orchestrator turn, no framing beyond the
/// request/response types. History persistence is the caller's problem.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let media = match (request.image_data, request.mime_type) {
        (Some(data), Some(mime_type)) => Some(InlineData { mime_type, data }),
        _ => None,
    };

    let outcome = state
        .orchestrator
        .run(
            request.prompt.as_deref(),
            request.history.unwrap_or_default(),
            media,
        )
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.response_text,
        updated_history: outcome.updated_history,
    }))
}

/// Telegram webhook. Always acknowledges with 200: Telegram retries
/// failed deliveries, and a turn that errors is reported to the user
/// in-band instead.
async fn telegram_webhook(
    State(state): State<AppState>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update_id = update.update_id, "Received Telegram update");

    let Some(telegram) = state.telegram.clone() else {
        warn!("Received Telegram update but no bot token is configured");
        return StatusCode::OK;
    };

    handle_update(&state, &telegram, update).await;
    StatusCode::OK
}

async fn handle_update(state: &AppState, telegram: &TelegramClient, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let chat_id = message.chat.id;
    let Some(text) = message.text.filter(|t| !t.is_empty()) else {
        return;
    };

    let key = history_key(chat_id);

    match text.as_str() {
        "/start" => {
            reply(telegram, chat_id, GREETING).await;
            return;
        }
        "/clear" => {
            state.store.clear(&key).await;
            info!(chat_id, "History cleared");
            reply(telegram, chat_id, CLEARED).await;
            return;
        }
        _ if text.starts_with('/') => return,
        _ => {}
    }

    if let Err(e) = telegram.send_chat_action(chat_id, "typing").await {
        warn!(chat_id, error = %e, "Failed to send typing action");
    }

    let history = state.store.get(&key).await;
    match state.orchestrator.run(Some(&text), history, None).await {
        Ok(outcome) => {
            state.store.set(&key, outcome.updated_history).await;
            reply(telegram, chat_id, &outcome.response_text).await;
        }
        Err(e) => {
            error!(chat_id, error = %e, "Conversation turn failed");
            reply(telegram, chat_id, SERVER_ERROR_REPLY).await;
        }
    }
}

fn history_key(chat_id: i64) -> String {
    format!("chat:{chat_id}")
}

async fn reply(telegram: &TelegramClient, chat_id: i64, text: &str) {
    if let Err(e) = telegram.send_message(chat_id, text).await {
        error!(chat_id, error = %e, "Failed to send Telegram reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_accepts_camel_case_wire_format() {
        let request: ChatRequest = serde_json::from_value(serde_json::json!({
            "prompt": "what is this?",
            "history": [
                { "role": "user", "parts": [ { "text": "earlier" } ] }
            ],
            "imageData": "aGVsbG8=",
            "mimeType": "image/png"
        }))
        .unwrap();

        assert_eq!(request.prompt.as_deref(), Some("what is this?"));
        assert_eq!(request.history.unwrap().len(), 1);
        assert_eq!(request.image_data.as_deref(), Some("aGVsbG8="));
        assert_eq!(request.mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn chat_request_fields_are_all_optional() {
        let request: ChatRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(request.prompt.is_none());
        assert!(request.history.is_none());
    }

    #[test]
    fn chat_response_uses_camel_case_wire_format() {
        let response = ChatResponse {
            response: "hi".into(),
            updated_history: Vec::new(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("updatedHistory").is_some());
    }

    #[test]
    fn history_key_is_namespaced_by_chat() {
        assert_eq!(history_key(1234), "chat:1234");
        assert_ne!(history_key(1), history_key(2));
    }
}
