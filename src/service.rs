//! Request facade
//!
//! Resolves the deployment for a request, runs it against the session's
//! prior messages and records the new message once the run ends normally.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::agent::{
    AgentKind, ConversationEngine, DeploymentCatalog, RunOutcome, RunStatus, TracingObserver,
};
use crate::core::{Config, ConferError, Result};
use crate::llm::{Completer, OllamaClient};
use crate::session::SessionStore;
use crate::tools::standard_registry;

/// Liveness message
pub const HEALTH_MESSAGE: &str = "Hello Again! Your Multi Agent System is up and running";

/// Inbound chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(alias = "agent_name")]
    pub agent_kind: String,
    pub message: String,
    #[serde(alias = "session_id")]
    pub session_id: String,
}

impl ChatRequest {
    pub fn new(
        agent_kind: impl Into<String>,
        message: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_kind: agent_kind.into(),
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

/// How complete the returned message is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Completed,
    RoundExhausted,
    NoEligibleSpeaker,
    DisallowedTransition,
}

impl From<&RunStatus> for ChatStatus {
    fn from(status: &RunStatus) -> Self {
        match status {
            RunStatus::Completed => ChatStatus::Completed,
            RunStatus::RoundExhausted => ChatStatus::RoundExhausted,
            RunStatus::NoEligibleSpeaker { .. } => ChatStatus::NoEligibleSpeaker,
            RunStatus::DisallowedTransition { .. } => ChatStatus::DisallowedTransition,
        }
    }
}

/// Reply to a [`ChatRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub status: ChatStatus,
}

impl From<RunOutcome> for ChatResponse {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            status: ChatStatus::from(&outcome.status),
            message: outcome.content,
        }
    }
}

/// Entry point for chat requests
pub struct AgentService {
    engine: ConversationEngine,
    catalog: DeploymentCatalog,
    sessions: Arc<SessionStore>,
}

impl AgentService {
    pub fn new(
        engine: ConversationEngine,
        catalog: DeploymentCatalog,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            engine,
            catalog,
            sessions,
        }
    }

    /// Wire Ollama-backed completers, the standard tools and a fresh session store
    pub fn from_config(config: &Config) -> Result<Self> {
        let assistant: Arc<dyn Completer> =
            Arc::new(OllamaClient::from_config(config, &config.models.assistant)?);
        let manager: Arc<dyn Completer> =
            Arc::new(OllamaClient::from_config(config, &config.models.manager)?);
        let extractor: Arc<dyn Completer> =
            Arc::new(OllamaClient::from_config(config, &config.models.extractor)?);

        let registry = Arc::new(standard_registry(config, extractor)?);
        let engine = ConversationEngine::from_config(config, assistant, registry)
            .with_observer(Arc::new(TracingObserver));
        let catalog = DeploymentCatalog::new(config).with_manager_completer(manager);

        Ok(Self::new(
            engine,
            catalog,
            Arc::new(SessionStore::from_config(config)),
        ))
    }

    /// Override the round budget of every deployment
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.catalog = self.catalog.with_max_rounds(max_rounds);
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one chat request
    ///
    /// Unknown agent kinds fail with `AgentNotFound` before any completer
    /// or tool call. The message is added to the session only when the run
    /// was neither failed nor cancelled.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse> {
        let kind: AgentKind = request.agent_kind.parse()?;
        let chat = self.catalog.build(kind)?;

        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            guard = self.sessions.lock(&request.session_id) => Some(guard),
        };
        let Some(_guard) = guard else {
            return Err(ConferError::Cancelled);
        };

        let history = self.sessions.get(&request.session_id);
        tracing::info!(
            agent = %kind,
            session_id = %request.session_id,
            prior = history.len(),
            "chat request"
        );

        let outcome = self
            .engine
            .run(&chat, &request.message, &history, cancel)
            .await?;

        self.sessions
            .append(&request.session_id, request.message.clone());
        Ok(ChatResponse::from(outcome))
    }

    /// Liveness probe
    pub fn health(&self) -> &'static str {
        HEALTH_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_both_spellings() {
        let camel: ChatRequest = serde_json::from_str(
            r#"{"agentKind": "weather", "message": "weather for 30041", "sessionId": "s1"}"#,
        )
        .unwrap();
        let snake: ChatRequest = serde_json::from_str(
            r#"{"agent_name": "weather", "message": "weather for 30041", "session_id": "s1"}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel, ChatRequest::new("weather", "weather for 30041", "s1"));
    }

    #[test]
    fn test_response_shape() {
        let response = ChatResponse {
            message: "Sunny".into(),
            status: ChatStatus::RoundExhausted,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"message": "Sunny", "status": "round_exhausted"})
        );
    }

    #[test]
    fn test_status_mapping() {
        let status = RunStatus::DisallowedTransition {
            from: "user_proxy".into(),
            to: "csr_agent".into(),
        };
        assert_eq!(ChatStatus::from(&status), ChatStatus::DisallowedTransition);
    }
}
