//! Extraction tools
//!
//! Ask the completer to pull a single identifier (a ZIP code, a customer id)
//! out of free-form user input.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::core::{ConferError, Message, Result, ToolDefinition};
use crate::llm::Completer;
use crate::tools::registry::ToolFunction;

const ZIP_DIRECTIVE: &str = "You are a helpful assistant extracting ZIP codes from user input. \
User input can be text like 'Give me weather for 30041'. \
If the user input contains the zip code, extract it. \
If it does not, use the last zip code mentioned in the session chat history provided along with the user input. \
If no ZIP code is mentioned, return 'None'. Reply with the ZIP code only.";

const CUSTOMER_DIRECTIVE: &str = "You are a helpful assistant extracting customer id from user input. \
User input can be text like 'Give me balance for CUST002' or 'Give me invoices for CUST001'. \
If the user input does not contain the customer id, use the last customer id mentioned in the session chat history provided along with the user input. \
If you do not find a customer id, return 'None'. Reply with the customer id only.";

/// Completer-backed identifier extraction
pub struct ExtractTool {
    completer: Arc<dyn Completer>,
    directive: &'static str,
    subject: &'static str,
}

impl ExtractTool {
    /// Extracts ZIP codes
    pub fn zip_code(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            directive: ZIP_DIRECTIVE,
            subject: "ZIP code",
        }
    }

    /// Extracts customer ids
    pub fn customer_id(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            directive: CUSTOMER_DIRECTIVE,
            subject: "customer id",
        }
    }

    pub fn zip_code_definition() -> ToolDefinition {
        user_input_definition(
            "extract_zip_code",
            "Extract the ZIP code from the given text.",
            "User-provided text from which to extract the ZIP code.",
        )
    }

    pub fn customer_id_definition() -> ToolDefinition {
        user_input_definition(
            "extract_customer_id",
            "Extract the customer id from the given text.",
            "User-provided text from which to extract the customer id.",
        )
    }
}

fn user_input_definition(name: &str, description: &str, arg: &str) -> ToolDefinition {
    ToolDefinition::function(
        name,
        description,
        json!({
            "type": "object",
            "properties": {
                "user_input": {
                    "type": "string",
                    "description": arg
                }
            },
            "required": ["user_input"]
        }),
    )
}

#[async_trait]
impl ToolFunction for ExtractTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        let input = args
            .get("user_input")
            .and_then(Value::as_str)
            .ok_or_else(|| ConferError::Other("user_input must be a string".into()))?;

        let prompt = format!(
            "User Input: '{}'. If no {} is present, then return 'None'.",
            input, self.subject
        );
        let completion = self
            .completer
            .complete(self.directive, &[Message::user(prompt)], &[])
            .await?;

        Ok(Value::String(completion.content.trim().to_string()))
    }
}
