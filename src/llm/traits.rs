//! Completer trait for abstracting language-model backends
//!
//! The engine only ever sees this trait; Ollama, hosted APIs and scripted
//! test doubles all sit behind it.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolCall, ToolDefinition};

/// Response from a completer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Text content of the response
    pub content: String,
    /// Any tool calls the model wants to make
    pub tool_calls: Vec<ToolCall>,
    /// Model that generated the response
    pub model: String,
}

impl Completion {
    /// A plain text completion
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// A completion requesting a single tool call
    pub fn tool_call(call: ToolCall) -> Self {
        Self {
            tool_calls: vec![call],
            ..Default::default()
        }
    }
}

/// Turns a directive plus history into the next message
#[async_trait]
pub trait Completer: Send + Sync {
    /// Generate the next completion
    ///
    /// `directive` is the system prompt of the calling agent, `history` the
    /// conversation so far and `tools` the schemas the agent may call.
    async fn complete(
        &self,
        directive: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion>;

    /// Get the backend name
    fn name(&self) -> &str;
}
