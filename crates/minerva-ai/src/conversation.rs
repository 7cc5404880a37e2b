//! Conversation orchestrator.
//!
//! Drives one user turn against the backend: at most two rounds, with a
//! single tool-resolution round in between when the model requests one.
//! History persistence belongs to the caller; the orchestrator only
//! returns the extended history.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::tool::{ToolContext, ToolRegistry};
use crate::{AiError, Content, FunctionCall, GenerativeBackend, History, InlineData, Part};

/// The finish reason the backend reports when a candidate was dropped
/// by its safety filters.
const FINISH_SAFETY: &str = "SAFETY";

/// The unit returned to the caller: the reply text plus the history to
/// persist as the conversation's new state.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response_text: String,
    pub updated_history: History,
}

/// Orchestrates conversation turns against a generative backend and a
/// fixed tool registry. Holds no per-conversation state; concurrent
/// turns are independent.
pub struct Orchestrator {
    backend: Arc<dyn GenerativeBackend>,
    registry: ToolRegistry,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, registry: ToolRegistry) -> Self {
        Self { backend, registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Process one user turn.
    ///
    /// Appends the user message to `history`, runs round 1, resolves at
    /// most one requested tool call (feeding the result back for round
    /// 2), and returns the final reply together with the extended
    /// history. A tool call requested in round 2's response is left
    /// unresolved; that response is final regardless.
    ///
    /// # Errors
    ///
    /// `AiError::EmptyInput` when both `prompt` and `media` are absent
    /// (checked before any network call), or the backend error from a
    /// failed round.
    pub async fn run(
        &self,
        prompt: Option<&str>,
        history: History,
        media: Option<InlineData>,
    ) -> Result<TurnOutcome, AiError> {
        let mut user_parts = Vec::new();
        if let Some(text) = prompt.filter(|p| !p.is_empty()) {
            user_parts.push(Part::text(text));
        }
        if let Some(ref data) = media {
            user_parts.push(Part::inline_data(data.clone()));
        }
        if user_parts.is_empty() {
            return Err(AiError::EmptyInput);
        }

        let mut contents = history;
        contents.push(Content::user(user_parts));

        let declarations = self.registry.declarations();
        let mut response = self.backend.generate(&contents, &declarations).await?;

        let tool_round = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| {
                content
                    .function_call()
                    .cloned()
                    .map(|call| (content.clone(), call))
            });

        if let Some((model_turn, call)) = tool_round {
            // The backend correlates the follow-up round to the exact
            // tool-call message it issued, so the model's own content
            // goes back verbatim.
            contents.push(model_turn);

            let result = self.execute_tool(&call, media.as_ref()).await;
            contents.push(Content::user(vec![Part::function_response(
                call.name, result,
            )]));

            response = self.backend.generate(&contents, &declarations).await?;
        }

        let final_candidate = response.candidates.into_iter().next();
        let block_reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);

        let final_text = final_candidate
            .as_ref()
            .filter(|c| c.finish_reason.as_deref() != Some(FINISH_SAFETY))
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.leading_text())
            .map(str::to_string);

        match final_text {
            Some(text) => {
                if let Some(content) = final_candidate.and_then(|c| c.content) {
                    contents.push(content);
                }
                Ok(TurnOutcome {
                    response_text: text,
                    updated_history: contents,
                })
            }
            None => {
                // No usable content to persist as a model turn, so the
                // history ends at the last message we authored.
                let reason = match block_reason {
                    Some(blocked) => format!("request blocked: {blocked}"),
                    None => final_candidate
                        .and_then(|c| c.finish_reason)
                        .unwrap_or_else(|| "no valid response candidate".to_string()),
                };
                warn!(%reason, "Turn ended without usable content");
                Ok(TurnOutcome {
                    response_text: format!(
                        "Sorry, something went wrong: {reason}. Please try again later."
                    ),
                    updated_history: contents,
                })
            }
        }
    }

    /// Resolve and invoke the requested tool. Failures of any kind are
    /// folded into an `{error}` payload so the turn can still complete
    /// with a second round.
    async fn execute_tool(
        &self,
        call: &FunctionCall,
        media: Option<&InlineData>,
    ) -> serde_json::Value {
        let Some(tool) = self.registry.resolve(&call.name) else {
            warn!(tool = %call.name, "Model requested an unregistered tool");
            return json!({ "error": format!("tool {} not recognized", call.name) });
        };

        debug!(tool = %call.name, "Executing tool");
        let ctx = ToolContext { media };
        match tool.invoke(&call.args, &ctx).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool invocation failed");
                json!({ "error": e.to_string() })
            }
        }
    }
}
