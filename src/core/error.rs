//! Custom error types for Confer
//!
//! Provides a unified error handling system across all modules.

use std::time::Duration;

use thiserror::Error;

/// Main error type for Confer operations
#[derive(Error, Debug)]
pub enum ConferError {
    /// Requested agent kind has no deployment
    #[error("Agent '{0}', not available at this point.")]
    AgentNotFound(String),

    /// Requested speaker is not a permitted successor of the current one
    #[error("Transition from '{from}' to '{to}' is not allowed")]
    DisallowedTransition { from: String, to: String },

    /// The transition graph leaves no one to speak after the given agent
    #[error("No eligible speaker after '{0}'")]
    NoEligibleSpeaker(String),

    /// Tool name is not registered or not bound to the calling agent
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments are missing required keys or are malformed
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Failure raised by the tool capability itself
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Completer call exceeded its ceiling
    #[error("Completer timed out after {}s", .0.as_secs())]
    CompleterTimeout(Duration),

    /// Completer backend errors
    #[error("Completer error: {0}")]
    Completer(String),

    /// The owning request was cancelled
    #[error("Conversation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Confer operations
pub type Result<T> = std::result::Result<T, ConferError>;

impl ConferError {
    /// Create a completer error
    pub fn completer(msg: impl Into<String>) -> Self {
        Self::Completer(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(tool: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConferError::AgentNotFound("unknown".into());
        assert_eq!(err.to_string(), "Agent 'unknown', not available at this point.");

        let err = ConferError::CompleterTimeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "Completer timed out after 120s");
    }
}
