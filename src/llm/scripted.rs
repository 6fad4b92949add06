//! Scripted completer
//!
//! Replays a fixed sequence of replies. Used by tests and dry runs where no
//! model server is available.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::{ConferError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::traits::{Completer, Completion};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this completion
    Complete(Completion),
    /// Fail with a completer error
    Fail(String),
    /// Never resolve
    Hang,
}

/// A call observed by the scripted completer
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub directive: String,
    pub history: Vec<Message>,
    pub tools: Vec<String>,
}

/// Completer that answers from a script
#[derive(Debug, Default)]
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<Completion>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompleter {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with the same completion forever once the script runs out
    pub fn repeating(completion: Completion) -> Self {
        Self {
            fallback: Some(completion),
            ..Self::default()
        }
    }

    /// Queue a text reply
    pub fn then_text(self, content: impl Into<String>) -> Self {
        self.then(ScriptedReply::Complete(Completion::text(content)))
    }

    /// Queue a tool call reply
    pub fn then_tool(self, name: &str, arguments: serde_json::Value) -> Self {
        self.then(ScriptedReply::Complete(Completion::tool_call(ToolCall::new(
            name, arguments,
        ))))
    }

    /// Queue an arbitrary reply
    pub fn then(self, reply: ScriptedReply) -> Self {
        self.lock_replies().push_back(reply);
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(
        &self,
        directive: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion> {
        self.lock_calls().push(RecordedCall {
            directive: directive.to_string(),
            history: history.to_vec(),
            tools: tools.iter().map(|t| t.name().to_string()).collect(),
        });

        let next = self.lock_replies().pop_front();
        match next {
            Some(ScriptedReply::Complete(completion)) => Ok(completion),
            Some(ScriptedReply::Fail(msg)) => Err(ConferError::completer(msg)),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ConferError::completer("script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
