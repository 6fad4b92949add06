//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tool functions and routing tool calls to them.
//! Registration happens once at startup; afterwards the registry is shared
//! read-only across concurrent conversations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::core::{ConferError, Result, ToolCall, ToolDefinition, ToolResult};

/// A callable tool capability
#[async_trait]
pub trait ToolFunction: Send + Sync {
    /// Invoke the tool with validated arguments
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value>;
}

/// Adapter turning an async closure into a [`ToolFunction`]
pub struct FnTool<F>(F);

impl<F> FnTool<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> ToolFunction for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        (self.0)(args.clone()).await
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    required: Vec<String>,
    function: Arc<dyn ToolFunction>,
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; required keys come from the schema's `required` array
    pub fn register(&mut self, definition: ToolDefinition, function: impl ToolFunction + 'static) {
        let name = definition.name().to_string();
        let required = definition.required_keys();
        if self.tools.contains_key(&name) {
            tracing::warn!(tool = %name, "replacing registered tool");
        }
        self.tools.insert(
            name,
            RegisteredTool {
                definition,
                required,
                function: Arc::new(function),
            },
        );
    }

    /// Register an async closure as a tool
    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, f: F)
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.register(definition, FnTool::new(f));
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for the given names, in the given order; unknown names are skipped
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition.clone())
            .collect()
    }

    /// Look up and invoke a tool
    ///
    /// Fails with `UnknownTool` for unregistered names, `InvalidArguments`
    /// when the arguments are not an object or miss a required key, and
    /// `ToolExecution` for any failure raised by the tool itself.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ConferError::UnknownTool(name.to_string()))?;

        let parsed;
        let args = match args {
            Value::Object(map) => map,
            // Some models send the argument object as a JSON string
            Value::String(raw) => {
                parsed = serde_json::from_str::<Map<String, Value>>(raw).map_err(|e| {
                    ConferError::invalid_arguments(name, format!("not a JSON object: {}", e))
                })?;
                &parsed
            }
            Value::Null if tool.required.is_empty() => {
                parsed = Map::new();
                &parsed
            }
            _ => {
                return Err(ConferError::invalid_arguments(
                    name,
                    "arguments must be a JSON object",
                ))
            }
        };

        let missing: Vec<&str> = tool
            .required
            .iter()
            .filter(|key| !args.contains_key(key.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ConferError::invalid_arguments(
                name,
                format!("missing required keys: {}", missing.join(", ")),
            ));
        }

        tool.function.invoke(args).await.map_err(|e| match e {
            ConferError::ToolExecution { .. } => e,
            other => ConferError::tool(name, other.to_string()),
        })
    }

    /// Execute a tool call on behalf of an agent bound to `bindings`
    ///
    /// Errors never escape: they become a failed [`ToolResult`] so the
    /// issuing agent can see them on its next turn.
    pub async fn execute(&self, tool_call: &ToolCall, bindings: &[String]) -> ToolResult {
        let outcome = if bindings.iter().any(|b| b == &tool_call.name) {
            self.dispatch(&tool_call.name, &tool_call.arguments).await
        } else {
            Err(ConferError::UnknownTool(tool_call.name.clone()))
        };

        match outcome {
            Ok(data) => ToolResult::success_with_data(&tool_call.name, data),
            Err(e) => {
                tracing::warn!(tool = %tool_call.name, error = %e, "tool dispatch failed");
                ToolResult::failure(&tool_call.name, format!("Error: {}", e))
            }
        }
    }
}
