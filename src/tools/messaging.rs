//! Customer messaging tool

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::core::{Result, ToolDefinition};
use crate::tools::registry::ToolFunction;

/// Sends a text message to a customer phone number
///
/// Delivery is recorded in the log. The reply ends with the termination
/// token so a support hand-off finishes once the message is out.
#[derive(Debug, Clone, Default)]
pub struct SendTextMessageTool;

impl SendTextMessageTool {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::function(
            "send_text_message",
            "Sends text message to the customer contact using his phone number.",
            json!({
                "type": "object",
                "properties": {
                    "phone_number": {"type": "string", "description": "Phone number of the customer."},
                    "message": {"type": "string", "description": "Message for the customer."}
                },
                "required": ["phone_number", "message"]
            }),
        )
    }
}

#[async_trait]
impl ToolFunction for SendTextMessageTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        let phone = args.get("phone_number").and_then(Value::as_str).unwrap_or_default();
        let message = args.get("message").and_then(Value::as_str).unwrap_or_default();

        tracing::info!(phone_number = %phone, %message, "text message sent");

        Ok(Value::String(format!(
            "Message sent to the customer: {} TERMINATE.",
            message
        )))
    }
}
