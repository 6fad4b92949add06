//! Confer - multi-agent conversation orchestration
//!
//! Main entry point for the CLI application.

use clap::Parser;
use confer::agent::AgentKind;
use confer::cli::{chat_with_interrupt, render_response, InterruptHandle, ReplState};
use confer::service::{AgentService, ChatRequest};
use confer::{Config, Repl};
use tracing_subscriber::EnvFilter;

/// Confer - route a conversation through cooperating agents
#[derive(Parser, Debug)]
#[command(name = "confer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deployment to talk to (weather, finance)
    #[arg(long, short = 'a', default_value = "weather")]
    agent: String,

    /// Session id whose history is shared with the agents
    #[arg(long, short = 's')]
    session: Option<String>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Model backing the assistant agents
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Round limit for every deployment
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_rounds: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.models.assistant = model.clone();
    }

    if args.debug {
        config.engine.debug = true;
    }

    // RUST_LOG overrides; --debug => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.engine.debug {
            "confer=debug"
        } else {
            "confer=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let kind: AgentKind = args.agent.parse()?;
    let session_id = args
        .session
        .clone()
        .unwrap_or_else(|| format!("cli-{}", std::process::id()));

    let mut service = AgentService::from_config(&config)?;
    if let Some(max_rounds) = args.max_rounds {
        service = service.with_max_rounds(max_rounds);
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let request = ChatRequest::new(kind.as_str(), prompt, session_id);
        let interrupts = InterruptHandle::new();
        interrupts.spawn_listener();
        let response = chat_with_interrupt(&service, &request, &interrupts).await?;
        println!("{}", render_response(&response));
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::new(config, service, ReplState::new(kind, session_id));
    repl.run().await?;

    Ok(())
}
