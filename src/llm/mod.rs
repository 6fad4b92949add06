//! LLM module - completer backends
//!
//! Provides the `Completer` abstraction with Ollama as the primary backend.

pub mod ollama;
pub mod scripted;
pub mod traits;

pub use ollama::OllamaClient;
pub use scripted::{RecordedCall, ScriptedCompleter, ScriptedReply};
pub use traits::{Completer, Completion};
