//! Configuration management for Confer
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/confer/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{ConferError, Result};

/// Main configuration for Confer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub models: ModelConfig,
    /// Engine behavior
    #[serde(default)]
    pub engine: EngineConfig,
    /// Session history cache
    #[serde(default)]
    pub session: SessionConfig,
    /// Weather deployment
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Finance deployment
    #[serde(default)]
    pub finance: FinanceConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Models used by each kind of completer call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model backing assistant agents
    pub assistant: String,
    /// Model backing the group chat manager's speaker selection
    pub manager: String,
    /// Model backing the extraction tools
    pub extractor: String,
}

/// Conversation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ceiling for a single completer call
    /// Default: 120
    pub completer_timeout_secs: u64,
    /// Literal token agents emit to finish a conversation
    pub termination_token: String,
    /// Whether to show debug output
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            completer_timeout_secs: 120,
            termination_token: "TERMINATE".to_string(),
            debug: env::var("CONFER_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Session history cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle lifetime of a session since its last write
    /// Default: 3600
    pub ttl_secs: u64,
    /// Maximum number of live sessions
    /// Default: 100
    pub capacity: usize,
    /// Number of per-session lock stripes
    pub lock_stripes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            capacity: 100,
            lock_stripes: 16,
        }
    }
}

/// Weather deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_url: Option<String>,
    /// Weather API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Timeout for weather API requests
    pub request_timeout_secs: u64,
    /// Round limit for weather conversations
    /// Default: 10
    pub max_rounds: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: env::var("WEATHER_API_URL").ok(),
            api_key: env::var("WEATHER_API_KEY").ok(),
            request_timeout_secs: 5,
            max_rounds: 10,
        }
    }
}

/// Finance deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceConfig {
    /// Directory holding customer_details.json, balances.json and invoices.json
    pub data_dir: PathBuf,
    /// Round limit for finance group chats
    /// Default: 20
    pub max_rounds: usize,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            data_dir: env::var("CONFER_FINANCE_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            max_rounds: 20,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let assistant =
            env::var("CONFER_ASSISTANT_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string());
        Self {
            manager: env::var("CONFER_MANAGER_MODEL").unwrap_or_else(|_| assistant.clone()),
            extractor: env::var("CONFER_EXTRACTOR_MODEL").unwrap_or_else(|_| assistant.clone()),
            assistant,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("confer")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(ConferError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| ConferError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConferError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| ConferError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConferError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| ConferError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Completer call ceiling as a duration
    pub fn completer_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.completer_timeout_secs)
    }

    /// Session idle lifetime as a duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
