//! GenerativeBackend trait implementation for GeminiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{AiError, Content, GenerateResponse, GenerativeBackend, ToolDeclaration};

use super::client::GeminiClient;

/// Error bodies are truncated to this many bytes before being attached
/// to an error, to keep diagnostics short.
const ERROR_BODY_LIMIT: usize = 200;

pub(crate) fn truncate_body(body: &str) -> String {
    let mut end = body.len().min(ERROR_BODY_LIMIT);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(
        &self,
        contents: &[Content],
        tools: &[ToolDeclaration],
    ) -> Result<GenerateResponse, AiError> {
        let body = self.build_request_body(contents, tools);
        let url = self.api_url();

        debug!(model = %self.config.model, contents = contents.len(), "Gemini API request");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::BackendUnavailable {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        if let Some(usage) = parsed.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidate_tokens = usage.candidates_token_count,
                "Gemini API response"
            );
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_caps_long_bodies() {
        let body = "x".repeat(500);
        assert_eq!(truncate_body(&body).len(), 200);
    }

    #[test]
    fn truncation_keeps_short_bodies() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 100 two-byte characters; byte 200 falls on a boundary, but
        // one more character pushes the cut inside a code point.
        let body = "é".repeat(101);
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= 200);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
