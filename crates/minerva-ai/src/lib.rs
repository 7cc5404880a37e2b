//! AI core for Minerva.
//!
//! Provides the Gemini generateContent client together with:
//! - The conversation content model (roles, parts, inline media)
//! - Tool declarations and the tool registry
//! - The conversation orchestrator with a single tool-call round

pub mod conversation;
pub mod gemini;
pub mod tool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use conversation::{Orchestrator, TurnOutcome};
pub use gemini::{GeminiClient, GeminiConfig};
pub use tool::{Tool, ToolContext, ToolError, ToolRegistry};

/// The sender of a conversation entry. The backend only distinguishes
/// the human side ("user", which also carries tool results) from its
/// own turns ("model").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry in a conversation, as the Gemini API represents it.
///
/// Model-authored entries are replayed to the backend verbatim on later
/// rounds, so this type round-trips through serde without reshaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    /// The text of the first part, if the first part is a text part.
    pub fn leading_text(&self) -> Option<&str> {
        self.parts.first().and_then(|p| p.text.as_deref())
    }

    /// The first function call anywhere in this entry's parts.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(|p| p.function_call.as_ref())
    }
}

/// Ordered conversation history, oldest first.
pub type History = Vec<Content>;

/// A single typed part of a [`Content`] entry.
///
/// Mirrors the wire `Part` object: exactly one field is populated.
/// Use the constructors rather than filling fields by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(rename = "functionResponse", skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline_data(data: InlineData) -> Self {
        Self {
            inline_data: Some(data),
            ..Self::default()
        }
    }

    pub fn function_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.into(),
                args,
            }),
            ..Self::default()
        }
    }

    pub fn function_response(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            function_response: Some(FunctionResponse {
                name: name.into(),
                response,
            }),
            ..Self::default()
        }
    }
}

/// Inline binary media (e.g. a photo), base64-encoded as on the wire.
/// The payload is carried as received and never decoded in the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// A backend-issued instruction to invoke a named local tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// The result of a tool invocation, fed back to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: serde_json::Value,
}

/// Static description of a tool, handed to the backend so it can decide
/// when to request an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One generateContent response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(rename = "usageMetadata", skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

/// One proposed response. Only the first candidate is ever consulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(rename = "finishReason", skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Request-level feedback, present when the prompt itself was rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason", skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Token accounting, surfaced for logging only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u64,
}

impl UsageMetadata {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_token_count
            .saturating_add(self.candidates_token_count)
    }
}

/// A generative-language backend capable of one request/response round.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        contents: &[Content],
        tools: &[ToolDeclaration],
    ) -> Result<GenerateResponse, AiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("prompt and media are both empty")]
    EmptyInput,
    #[error("backend unavailable: HTTP {status}: {body}")]
    BackendUnavailable { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_wire_shape() {
        let json = serde_json::to_value(Part::text("hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "hello" }));
    }

    #[test]
    fn inline_data_part_wire_shape() {
        let part = Part::inline_data(InlineData {
            mime_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        });
        let json = serde_json::to_value(part).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" }
            })
        );
    }

    #[test]
    fn function_response_part_wire_shape() {
        let part = Part::function_response("get_current_weather", serde_json::json!({"temp": 21}));
        let json = serde_json::to_value(part).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "functionResponse": {
                    "name": "get_current_weather",
                    "response": { "temp": 21 }
                }
            })
        );
    }

    #[test]
    fn model_content_roundtrips_verbatim() {
        // A model turn carrying a function call must survive
        // deserialize -> serialize unchanged, since it is echoed back
        // to the backend on the follow-up round.
        let wire = serde_json::json!({
            "role": "model",
            "parts": [
                { "functionCall": { "name": "perform_web_search", "args": { "query": "rust" } } }
            ]
        });
        let content: Content = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(serde_json::to_value(&content).unwrap(), wire);
    }

    #[test]
    fn function_call_args_default_to_null() {
        // Gemini may omit `args` entirely for zero-argument calls.
        let call: FunctionCall =
            serde_json::from_value(serde_json::json!({ "name": "list_images" })).unwrap();
        assert!(call.args.is_null());
    }

    #[test]
    fn response_with_block_reason_parses() {
        let json = serde_json::json!({
            "candidates": [ { "finishReason": "SAFETY" } ],
            "promptFeedback": { "blockReason": "OTHER" }
        });
        let response: GenerateResponse = serde_json::from_value(json).unwrap();
        assert_eq!(
            response.candidates[0].finish_reason.as_deref(),
            Some("SAFETY")
        );
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("OTHER")
        );
    }

    #[test]
    fn leading_text_requires_text_first() {
        let content = Content {
            role: Role::Model,
            parts: vec![
                Part::function_call("get_current_weather", serde_json::json!({})),
                Part::text("checking"),
            ],
        };
        assert!(content.leading_text().is_none());
        assert!(content.function_call().is_some());
    }

    #[test]
    fn usage_total_saturates() {
        let usage = UsageMetadata {
            prompt_token_count: u64::MAX,
            candidates_token_count: 1,
        };
        assert_eq!(usage.total_tokens(), u64::MAX);
    }
}
