//! Tool trait and registry.
//!
//! Tools are local capabilities the backend can request by name during
//! a conversation (weather lookup, web search, image operations). The
//! registry is read-only after startup: adding a tool means adding a
//! registry entry, never touching the orchestrator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::{InlineData, ToolDeclaration};

/// Per-turn context handed to every tool invocation.
///
/// Binary data cannot travel through the function-call argument schema,
/// so the caller's media for the current turn rides here instead. Most
/// tools ignore it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolContext<'a> {
    pub media: Option<&'a InlineData>,
}

/// A locally implemented capability the backend can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The static declaration handed to the backend.
    fn declaration(&self) -> ToolDeclaration;

    /// Execute the tool with the call's arguments.
    async fn invoke(&self, args: &JsonValue, ctx: &ToolContext<'_>) -> Result<JsonValue, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("no image attached to this turn")]
    MissingMedia,
}

/// Registry of available tools, keyed by declaration name.
///
/// Registration order is preserved so the declarations handed to the
/// backend are stable across turns.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<(ToolDeclaration, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with a duplicate name replaces the
    /// earlier entry in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let declaration = tool.declaration();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.name == declaration.name)
        {
            *entry = (declaration, tool);
        } else {
            self.entries.push((declaration, tool));
        }
    }

    /// All declarations, in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.entries.iter().map(|(d, _)| d.clone()).collect()
    }

    /// Look up a tool implementation by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.entries
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, t)| Arc::clone(t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
