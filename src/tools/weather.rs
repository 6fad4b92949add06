//! Weather lookup tool
//!
//! Calls a WeatherAPI-style endpoint with `key` and `q` query parameters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::core::config::WeatherConfig;
use crate::core::{ConferError, Result, ToolDefinition};
use crate::tools::registry::ToolFunction;

const TOOL_NAME: &str = "fetch_weather_data";

/// Fetches current conditions for a ZIP code
pub struct WeatherTool {
    client: Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    location: Location,
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl WeatherTool {
    /// Create the tool from configuration
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConferError::with_context("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::function(
            TOOL_NAME,
            "Fetch the current weather for a given ZIP code.",
            json!({
                "type": "object",
                "properties": {
                    "zip_code": {
                        "type": "string",
                        "description": "The 5-digit ZIP code for which to retrieve weather."
                    }
                },
                "required": ["zip_code"]
            }),
        )
    }
}

#[async_trait]
impl ToolFunction for WeatherTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        let zip_code = match args.get("zip_code") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Weather API key is missing");
            return Err(ConferError::tool(TOOL_NAME, "Weather API key is not configured"));
        };
        let Some(api_url) = self.api_url.as_deref() else {
            return Err(ConferError::tool(TOOL_NAME, "Weather API URL is not configured"));
        };

        let response = self
            .client
            .get(api_url)
            .query(&[("key", api_key), ("q", zip_code.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!("Error fetching weather data: {}", e);
                ConferError::tool(TOOL_NAME, "Failed to fetch weather data.")
            })?;

        let data: WeatherResponse = response.json().await.map_err(|e| {
            tracing::error!("Unexpected weather payload: {}", e);
            ConferError::tool(TOOL_NAME, "Failed to fetch weather data.")
        })?;

        Ok(json!({
            "location": data.location.name,
            "temperature": data.current.temp_c,
            "condition": data.current.condition.text,
        }))
    }
}
