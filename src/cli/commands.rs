//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::AgentKind;
use crate::service::AgentService;

/// Deployment and session the REPL currently talks to
#[derive(Debug, Clone)]
pub struct ReplState {
    pub agent: AgentKind,
    pub session_id: String,
}

impl ReplState {
    pub fn new(agent: AgentKind, session_id: impl Into<String>) -> Self {
        Self {
            agent,
            session_id: session_id.into(),
        }
    }
}

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub fn handle_command(input: &str, state: &mut ReplState, service: &AgentService) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::None;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].trim_start_matches('/').to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" if args.is_empty() => CommandResult::Exit,

        "help" | "?" if args.is_empty() => CommandResult::Handled(help_text()),

        "agent" if parts.len() == 1 || args.split_whitespace().count() == 1 => {
            if args.is_empty() {
                return CommandResult::Handled(format!("Current agent: {}", state.agent));
            }
            match args.parse::<AgentKind>() {
                Ok(kind) => {
                    state.agent = kind;
                    CommandResult::Handled(format!("Agent set to: {}", kind))
                }
                Err(e) => CommandResult::Handled(format!(
                    "{} Available: {}",
                    e,
                    AgentKind::all().map(|k| k.as_str()).join(", ")
                )),
            }
        }

        "session" if parts.len() == 1 || args.split_whitespace().count() == 1 => {
            if args.is_empty() {
                return CommandResult::Handled(format!("Current session: {}", state.session_id));
            }
            state.session_id = args.to_string();
            CommandResult::Handled(format!("Session set to: {}", args))
        }

        "status" if args.is_empty() => {
            let prior = service.sessions().get(&state.session_id).len();
            CommandResult::Handled(format!(
                "Confer Status:\n\
                 ─────────────────────────────\n\
                 Agent:    {}\n\
                 Session:  {}\n\
                 History:  {} messages\n\
                 Sessions: {} stored\n\
                 Service:  {}",
                state.agent,
                state.session_id,
                prior,
                service.sessions().len(),
                service.health()
            ))
        }

        _ => {
            if input.starts_with('/') {
                CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                ))
            } else {
                // Not a command, treat as normal input
                CommandResult::Continue(input.to_string())
            }
        }
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Confer Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Confer
  status           Show the current agent and session
  agent <kind>     Switch deployment (weather, finance)
  session <id>     Switch session history

Keyboard Shortcuts:
  Ctrl+C           Cancel the running conversation, or exit when idle
  Ctrl+D           Exit Confer

Tips:
  - Each message runs one conversation to completion
  - Earlier messages of the session are shared with the agents
─────────────────────────────────────────────"#
        .to_string()
}
