//! CLI module - command-line interface
//!
//! Contains the REPL and command parsing.

pub mod commands;
pub mod repl;

pub use commands::{CommandResult, ReplState};
pub use repl::{chat_with_interrupt, render_response, InterruptHandle, Repl};
