//! Engine observability hooks

use crate::agent::loop_state::RunOutcome;
use crate::core::{ConferError, Message};

/// Callbacks fired by the engine; every method defaults to a no-op
pub trait EngineObserver: Send + Sync {
    fn turn_started(&self, _round: usize, _speaker: &str) {}

    fn turn_finished(&self, _round: usize, _message: &Message) {}

    fn run_finished(&self, _outcome: std::result::Result<&RunOutcome, &ConferError>) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Observer that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn turn_started(&self, round: usize, speaker: &str) {
        tracing::debug!(round, %speaker, "turn started");
    }

    fn turn_finished(&self, round: usize, message: &Message) {
        tracing::debug!(
            round,
            speaker = %message.speaker,
            role = %message.role,
            tool_call = message.is_tool_call(),
            "turn finished"
        );
    }

    fn run_finished(&self, outcome: std::result::Result<&RunOutcome, &ConferError>) {
        match outcome {
            Ok(outcome) => match outcome.status.halt_error() {
                Some(reason) => tracing::warn!(%reason, rounds = outcome.rounds, "conversation halted"),
                None => tracing::info!(status = %outcome.status, rounds = outcome.rounds, "conversation finished"),
            },
            Err(e) => tracing::warn!(error = %e, "conversation failed"),
        }
    }
}
