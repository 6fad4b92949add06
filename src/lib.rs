//! Confer - multi-agent conversation orchestration
//!
//! Routes a user message through a small group of cooperating agents until
//! one of them declares the task finished or the round budget runs out.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: `Completer` abstraction with an Ollama backend
//! - **Tools**: Tool registry plus the extraction, weather, finance and messaging tools
//! - **Agent**: Participants, transition graph and the conversation engine
//! - **Session**: Expiring per-session history
//! - **Service**: Request facade tying deployments, engine and sessions together
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use confer::service::{AgentService, ChatRequest};
//! use confer::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> confer::Result<()> {
//!     let service = AgentService::from_config(&Config::load())?;
//!     let request = ChatRequest::new("weather", "weather for 30041", "session-1");
//!
//!     let response = service.chat(&request, &CancellationToken::new()).await?;
//!     println!("{}", response.message);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod service;
pub mod session;
pub mod tools;

// Re-export commonly used items
pub use agent::{ConversationEngine, GroupChat, RunOutcome, RunStatus};
pub use cli::Repl;
pub use core::{Config, ConferError, Result};
pub use service::{AgentService, ChatRequest, ChatResponse, ChatStatus};
pub use session::SessionStore;
