//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with tool calling support.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{
    Config, ConferError, Message, MessageContent, Result, Role, ToolCall, ToolDefinition,
};
use crate::llm::traits::{Completer, Completion};

/// Ollama API client bound to one model
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    model: String,
}

impl OllamaClient {
    /// Create a client for `model` from configuration
    pub fn from_config(config: &Config, model: impl Into<String>) -> Result<Self> {
        Self::build(
            config.ollama_url(),
            model,
            Duration::from_secs(config.ollama.timeout_secs),
        )
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::build(base_url, model, Duration::from_secs(120))
    }

    fn build(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConferError::with_context("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    /// The model this client talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert internal Message to Ollama format
    fn to_ollama_message(msg: &Message) -> OllamaMessage {
        match &msg.content {
            MessageContent::Text(text) => OllamaMessage {
                role: msg.role.to_string(),
                content: text.clone(),
                tool_calls: None,
            },
            MessageContent::ToolCall(call) => OllamaMessage {
                role: Role::Assistant.to_string(),
                content: String::new(),
                tool_calls: Some(vec![OllamaToolCall {
                    function: OllamaFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                }]),
            },
            MessageContent::ToolResult(result) => OllamaMessage {
                role: Role::Tool.to_string(),
                content: result.output.clone(),
                tool_calls: None,
            },
        }
    }

    /// Convert Ollama response to a Completion
    fn to_completion(response: ChatResponse) -> Completion {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Completion {
            content: response.message.content,
            tool_calls,
            model: response.model,
        }
    }
}

#[async_trait]
impl Completer for OllamaClient {
    async fn complete(
        &self,
        directive: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion> {
        let mut ollama_messages = Vec::with_capacity(history.len() + 1);
        if !directive.is_empty() {
            ollama_messages.push(Self::to_ollama_message(&Message::system(directive)));
        }
        ollama_messages.extend(history.iter().map(Self::to_ollama_message));

        let request = ChatRequest {
            model: &self.model,
            messages: ollama_messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = tools.len(),
            "ollama chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ConferError::completer(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    ConferError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(ConferError::completer(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| ConferError::completer(format!("Failed to parse response: {}", e)))?;

        Ok(Self::to_completion(chat_response))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
