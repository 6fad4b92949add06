//! Shared types used across Confer modules
//!
//! Contains message structures, tool definitions, and common data types.

use serde::{Deserialize, Serialize};

/// Chat role attached to every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Body of a message: free text, a tool invocation, or a tool's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the agent that produced the message
    pub speaker: String,
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: MessageContent,
    /// Position in the conversation, assigned on append
    #[serde(default)]
    pub ordinal: usize,
}

impl Message {
    /// Create a message with explicit speaker, role and content
    pub fn new(speaker: impl Into<String>, role: Role, content: MessageContent) -> Self {
        Self {
            speaker: speaker.into(),
            role,
            content,
            ordinal: 0,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", Role::User, MessageContent::Text(content.into()))
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", Role::System, MessageContent::Text(content.into()))
    }

    /// Create a new assistant message
    pub fn assistant(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(speaker, Role::Assistant, MessageContent::Text(content.into()))
    }

    /// Create an assistant message carrying a tool call
    pub fn tool_call(speaker: impl Into<String>, call: ToolCall) -> Self {
        Self::new(speaker, Role::Assistant, MessageContent::ToolCall(call))
    }

    /// Create a tool result message
    pub fn tool_result(speaker: impl Into<String>, result: ToolResult) -> Self {
        Self::new(speaker, Role::Tool, MessageContent::ToolResult(result))
    }

    /// Textual rendering of the content
    ///
    /// Tool calls render as `name(arguments)`, tool results as their output.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::ToolCall(call) => format!("{}({})", call.name, call.arguments),
            MessageContent::ToolResult(result) => result.output.clone(),
        }
    }

    /// The tool call carried by this message, if any
    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match &self.content {
            MessageContent::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    /// Whether the message is a tool call
    pub fn is_tool_call(&self) -> bool {
        self.as_tool_call().is_some()
    }

    /// Whether the message is a tool result
    pub fn is_tool_result(&self) -> bool {
        matches!(self.content, MessageContent::ToolResult(_))
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Name of the function
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Keys listed in the schema's `required` array
    pub fn required_keys(&self) -> Vec<String> {
        self.function
            .parameters
            .get("required")
            .and_then(|v| v.as_array())
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Optional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// Create a successful result with structured data
    pub fn success_with_data(tool_name: impl Into<String>, data: serde_json::Value) -> Self {
        let output = match &data {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            tool_name: tool_name.into(),
            success: true,
            output,
            data: Some(data),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: error.into(),
            data: None,
        }
    }
}
