//! Interactive REPL for Confer
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::cli::commands::{handle_command, CommandResult, ReplState};
use crate::core::{Config, ConferError, Result};
use crate::service::{AgentService, ChatRequest, ChatResponse, ChatStatus};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    service: AgentService,
    state: ReplState,
    interrupts: InterruptHandle,
}

impl Repl {
    /// Create a REPL over an existing service
    pub fn new(config: Config, service: AgentService, state: ReplState) -> Self {
        Self {
            config,
            service,
            state,
            interrupts: InterruptHandle::new(),
        }
    }

    /// Send one message, cancelling the run on Ctrl-C
    pub async fn ask(&self, message: &str) -> Result<ChatResponse> {
        let request = ChatRequest::new(
            self.state.agent.as_str(),
            message,
            self.state.session_id.as_str(),
        );
        chat_with_interrupt(&self.service, &request, &self.interrupts).await
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();
        self.interrupts.spawn_listener();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            // Print prompt
            print!("You [{}]: ", self.state.agent);
            stdout.flush()?;

            // Read input
            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            match handle_command(&input, &mut self.state, &self.service) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Handled(output) => {
                    println!("{}\n", output);
                }
                CommandResult::None => continue,
                CommandResult::Continue(input) => match self.ask(&input).await {
                    Ok(response) => println!("\n{}\n", render_response(&response)),
                    Err(ConferError::Cancelled) => eprintln!("\nCancelled.\n"),
                    Err(e) => eprintln!("\nError: {}\n", e),
                },
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!("\nConfer - multi-agent conversations\n");
        println!("Ollama:     {}", self.config.ollama_url());
        println!("Models:");
        println!("  Assistant: {}", self.config.models.assistant);
        println!("  Manager:   {}", self.config.models.manager);
        println!("  Extractor: {}", self.config.models.extractor);
        println!("Agent:      {}", self.state.agent);
        println!("Session:    {}", self.state.session_id);
        println!();
        println!("Commands: help, agent, session, status, exit");
        println!("─────────────────────────────────────────────────────────────");
    }
}

/// Routes Ctrl-C to the run in flight
///
/// A single listener serves the whole process: while a request runs, Ctrl-C
/// cancels it; when idle, Ctrl-C exits.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the process-wide Ctrl-C listener
    pub fn spawn_listener(&self) {
        let handle = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !handle.interrupt() {
                    println!("\nGoodbye!");
                    std::process::exit(130);
                }
            }
        });
    }

    /// Register a new run and return its cancellation token
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    /// Forget the current run
    pub fn end(&self) {
        self.slot().take();
    }

    /// Cancel the run in flight; returns false when nothing is running
    pub fn interrupt(&self) -> bool {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run a chat request that Ctrl-C can cancel
pub async fn chat_with_interrupt(
    service: &AgentService,
    request: &ChatRequest,
    interrupts: &InterruptHandle,
) -> Result<ChatResponse> {
    let cancel = interrupts.begin();
    let result = service.chat(request, &cancel).await;
    interrupts.end();
    result
}

/// Format a response for the terminal, flagging incomplete answers
pub fn render_response(response: &ChatResponse) -> String {
    match response.status {
        ChatStatus::Completed => format!("Assistant:\n{}", response.message),
        ChatStatus::RoundExhausted => format!(
            "Assistant (incomplete, round limit reached):\n{}",
            response.message
        ),
        ChatStatus::NoEligibleSpeaker | ChatStatus::DisallowedTransition => format!(
            "Assistant (stopped early, no agent could continue):\n{}",
            response.message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_flags_incomplete_answers() {
        let done = ChatResponse {
            message: "Sunny.".into(),
            status: ChatStatus::Completed,
        };
        assert_eq!(render_response(&done), "Assistant:\nSunny.");

        let partial = ChatResponse {
            message: "Which ZIP code?".into(),
            status: ChatStatus::RoundExhausted,
        };
        assert!(render_response(&partial).contains("round limit"));
    }

    #[test]
    fn test_interrupt_only_cancels_the_run_in_flight() {
        let interrupts = InterruptHandle::new();
        assert!(!interrupts.interrupt());

        let token = interrupts.begin();
        assert!(interrupts.interrupt());
        assert!(token.is_cancelled());

        // the slot is cleared, so a second Ctrl-C would exit
        assert!(!interrupts.interrupt());

        let next = interrupts.begin();
        interrupts.end();
        assert!(!interrupts.interrupt());
        assert!(!next.is_cancelled());
    }
}
