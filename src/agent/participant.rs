//! Conversation participants
//!
//! An [`Agent`] is immutable for the lifetime of one conversation. Its role
//! decides how it takes a turn: assistants call the completer, the proxy
//! relays the user and runs tool calls, the manager only picks speakers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::agent::conversation::Conversation;
use crate::agent::group_chat::GroupChat;
use crate::core::{ConferError, Message, MessageContent, Result, Role, ToolDefinition};
use crate::llm::{Completer, Completion};
use crate::tools::ToolRegistry;

/// Default literal that marks a finished conversation
pub const TERMINATION_TOKEN: &str = "TERMINATE";

/// How an agent takes part in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Generates content through the completer, may request tool calls
    Assistant,
    /// Stands in for the user; relays input and executes tool calls
    Proxy,
    /// Chooses the next speaker of a group chat
    Manager,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Assistant => write!(f, "assistant"),
            AgentRole::Proxy => write!(f, "proxy"),
            AgentRole::Manager => write!(f, "manager"),
        }
    }
}

/// Decides whether a message ends the conversation
#[derive(Clone)]
pub enum TerminationPredicate {
    /// Never terminates
    Never,
    /// Case-insensitive containment of the token once surrounding
    /// whitespace and punctuation are stripped
    Token(String),
    /// Arbitrary predicate
    Custom(Arc<dyn Fn(&Message) -> bool + Send + Sync>),
}

impl TerminationPredicate {
    /// Token predicate for `token`
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Wrap a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Evaluate the predicate; tool calls never terminate
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Self::Never => false,
            Self::Token(token) => match &message.content {
                MessageContent::ToolCall(_) => false,
                _ => contains_token(&message.text(), token),
            },
            Self::Custom(f) => f(message),
        }
    }
}

impl Default for TerminationPredicate {
    fn default() -> Self {
        Self::token(TERMINATION_TOKEN)
    }
}

impl fmt::Debug for TerminationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "Never"),
            Self::Token(token) => f.debug_tuple("Token").field(token).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Whether `content` carries `token`, ignoring case and surrounding punctuation
pub fn contains_token(content: &str, token: &str) -> bool {
    let stripped =
        content.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
    !token.is_empty() && stripped.to_lowercase().contains(&token.to_lowercase())
}

/// Remove `token.` and `token` (exact case) and trim the result
pub fn strip_token(content: &str, token: &str) -> String {
    if token.is_empty() {
        return content.trim().to_string();
    }
    content
        .replace(&format!("{}.", token), "")
        .replace(token, "")
        .trim()
        .to_string()
}

/// Everything an agent needs to take a turn
pub struct TurnContext<'a> {
    /// Completer used when the agent has none of its own
    pub completer: &'a Arc<dyn Completer>,
    pub registry: &'a ToolRegistry,
    pub chat: &'a GroupChat,
    /// The user's message for this request
    pub opening: &'a str,
    pub timeout: Duration,
    pub cancel: &'a CancellationToken,
}

impl TurnContext<'_> {
    /// Call the agent's completer under the timeout ceiling, abandoning the
    /// call when the request is cancelled
    pub async fn complete(
        &self,
        agent: &Agent,
        directive: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion> {
        let completer = agent.completer.as_ref().unwrap_or(self.completer);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ConferError::Cancelled),
            result = tokio::time::timeout(self.timeout, completer.complete(directive, history, tools)) => {
                match result {
                    Ok(completion) => completion,
                    Err(_) => Err(ConferError::CompleterTimeout(self.timeout)),
                }
            }
        }
    }
}

/// A configured conversation participant
#[derive(Clone)]
pub struct Agent {
    name: String,
    role: AgentRole,
    directive: String,
    tools: Vec<String>,
    termination: TerminationPredicate,
    completer: Option<Arc<dyn Completer>>,
    auto_reply: String,
}

impl Agent {
    fn new(name: impl Into<String>, role: AgentRole, directive: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            directive: directive.into(),
            tools: Vec::new(),
            termination: TerminationPredicate::default(),
            completer: None,
            auto_reply: String::new(),
        }
    }

    /// An assistant driven by `directive`
    pub fn assistant(name: impl Into<String>, directive: impl Into<String>) -> Self {
        Self::new(name, AgentRole::Assistant, directive)
    }

    /// A user proxy; it has no directive
    ///
    /// Relayed user text never ends a conversation, and tool results are
    /// judged by the agent that issued the call.
    pub fn proxy(name: impl Into<String>) -> Self {
        Self::new(name, AgentRole::Proxy, "").with_termination(TerminationPredicate::Never)
    }

    /// A group chat manager
    pub fn manager(name: impl Into<String>, directive: impl Into<String>) -> Self {
        Self::new(name, AgentRole::Manager, directive)
    }

    /// Bind tool names this agent may invoke
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the termination predicate
    pub fn with_termination(mut self, termination: TerminationPredicate) -> Self {
        self.termination = termination;
        self
    }

    /// Use a dedicated completer instead of the engine's default
    pub fn with_completer(mut self, completer: Arc<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Text a proxy sends when it has nothing to relay
    pub fn with_auto_reply(mut self, reply: impl Into<String>) -> Self {
        self.auto_reply = reply.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Tool names bound to this agent
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// Evaluate this agent's termination predicate
    pub fn is_terminal(&self, message: &Message) -> bool {
        self.termination.matches(message)
    }

    /// Produce this agent's next message
    pub async fn produce_turn(
        &self,
        conversation: &Conversation,
        ctx: &TurnContext<'_>,
    ) -> Result<Message> {
        match self.role {
            AgentRole::Assistant => self.generate(conversation, ctx).await,
            AgentRole::Proxy => self.relay(conversation, ctx).await,
            AgentRole::Manager => Err(ConferError::config(format!(
                "manager '{}' selects speakers and cannot take a turn",
                self.name
            ))),
        }
    }

    async fn generate(&self, conversation: &Conversation, ctx: &TurnContext<'_>) -> Result<Message> {
        let tools = ctx.registry.definitions_for(&self.tools);
        let completion = ctx
            .complete(self, &self.directive, conversation.messages(), &tools)
            .await?;

        let mut calls = completion.tool_calls.into_iter();
        match calls.next() {
            Some(call) => {
                let dropped = calls.count();
                if dropped > 0 {
                    tracing::warn!(agent = %self.name, dropped, "only the first tool call per turn is dispatched");
                }
                Ok(Message::tool_call(&self.name, call))
            }
            None => Ok(Message::assistant(&self.name, completion.content)),
        }
    }

    async fn relay(&self, conversation: &Conversation, ctx: &TurnContext<'_>) -> Result<Message> {
        if let Some(last) = conversation.last() {
            if let Some(call) = last.as_tool_call() {
                let bindings = ctx
                    .chat
                    .agent(&last.speaker)
                    .map(|a| a.tools())
                    .unwrap_or_default();

                tracing::debug!(proxy = %self.name, caller = %last.speaker, tool = %call.name, "dispatching tool call");

                let result = tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => None,
                    result = ctx.registry.execute(call, bindings) => Some(result),
                };
                let Some(result) = result else {
                    return Err(ConferError::Cancelled);
                };
                return Ok(Message::tool_result(&self.name, result));
            }
        }

        let content = if conversation.rounds() == 0 {
            ctx.opening.to_string()
        } else {
            self.auto_reply.clone()
        };
        Ok(Message::new(&self.name, Role::User, MessageContent::Text(content)))
    }

    /// As a manager, ask the completer which candidate speaks next
    ///
    /// Returns the raw, trimmed reply; the caller validates it.
    pub async fn choose_speaker(
        &self,
        candidates: &[&str],
        conversation: &Conversation,
        ctx: &TurnContext<'_>,
    ) -> Result<String> {
        let roles = candidates
            .iter()
            .map(|name| {
                let role = ctx
                    .chat
                    .agent(name)
                    .map(|a| a.role().to_string())
                    .unwrap_or_default();
                format!("{}: {}", name, role)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let directive = format!(
            "{}\n\nYou are in a role play game. The following roles are available:\n{}",
            self.directive.trim(),
            roles
        );

        let mut history = conversation.messages().to_vec();
        history.push(Message::system(format!(
            "Read the above conversation. Then select the next role from [{}] to play. Only return the role.",
            candidates.join(", ")
        )));

        let completion = ctx.complete(self, &directive, &history, &[]).await?;
        Ok(completion.content.trim().to_string())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("tools", &self.tools)
            .field("termination", &self.termination)
            .finish()
    }
}
