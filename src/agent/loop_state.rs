//! Engine loop state management
//!
//! Tracks the phase and round budget of one run and describes how it ended.

use serde::Serialize;

use crate::core::{ConferError, Message};

/// Phase of the conversation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    /// An agent emitted the termination token
    Completed,
    /// The round budget ran out
    RoundExhausted,
    /// Speaker selection could not continue
    Halted,
    Failed,
}

impl Phase {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        !matches!(self, Phase::Idle | Phase::Running)
    }
}

/// State of the engine loop
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Rounds taken so far
    pub round: usize,
    /// Maximum allowed rounds
    pub max_rounds: usize,
    /// Current phase
    pub phase: Phase,
}

impl LoopState {
    /// Create a new loop state with the given round budget
    pub fn new(max_rounds: usize) -> Self {
        Self {
            round: 0,
            max_rounds,
            phase: Phase::Idle,
        }
    }

    /// Idle -> Running
    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
        }
    }

    /// Check if the loop should continue
    pub fn should_continue(&self) -> bool {
        self.phase == Phase::Running && self.round < self.max_rounds
    }

    /// Increment the round counter
    pub fn next_round(&mut self) {
        self.round += 1;
    }

    /// Whether the budget is spent
    pub fn exhausted(&self) -> bool {
        self.round >= self.max_rounds
    }

    /// Move to a terminal phase; terminal phases are final
    pub fn finish(&mut self, phase: Phase) {
        if !self.phase.is_terminal() {
            self.phase = phase;
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// An agent emitted the termination token
    Completed,
    /// The round budget ran out before termination
    RoundExhausted,
    /// Nobody may speak after `after`
    NoEligibleSpeaker { after: String },
    /// An explicitly requested speaker is not a permitted successor
    DisallowedTransition { from: String, to: String },
}

impl RunStatus {
    /// Only `Completed` is a complete answer
    pub fn is_complete(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::RoundExhausted => "round_exhausted",
            RunStatus::NoEligibleSpeaker { .. } => "no_eligible_speaker",
            RunStatus::DisallowedTransition { .. } => "disallowed_transition",
        }
    }

    /// The integrity violation behind a halted run
    pub fn halt_error(&self) -> Option<ConferError> {
        match self {
            RunStatus::NoEligibleSpeaker { after } => {
                Some(ConferError::NoEligibleSpeaker(after.clone()))
            }
            RunStatus::DisallowedTransition { from, to } => Some(ConferError::DisallowedTransition {
                from: from.clone(),
                to: to.clone(),
            }),
            RunStatus::Completed | RunStatus::RoundExhausted => None,
        }
    }

    /// Loop phase matching this status
    pub fn phase(&self) -> Phase {
        match self {
            RunStatus::Completed => Phase::Completed,
            RunStatus::RoundExhausted => Phase::RoundExhausted,
            RunStatus::NoEligibleSpeaker { .. } | RunStatus::DisallowedTransition { .. } => {
                Phase::Halted
            }
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Final answer; token-stripped only when `Completed`
    pub content: String,
    /// Rounds taken
    pub rounds: usize,
    /// Messages produced during the run
    pub messages: Vec<Message>,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}
