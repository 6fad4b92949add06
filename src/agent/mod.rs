//! Agent module - participants, speaker transitions and the conversation engine
//!
//! Contains the state machine that runs a group chat turn by turn.

pub mod conversation;
pub mod deployments;
pub mod group_chat;
pub mod loop_state;
pub mod observer;
pub mod orchestrator;
pub mod participant;
pub mod prompts;
pub mod transition;

pub use conversation::Conversation;
pub use deployments::{AgentKind, DeploymentCatalog};
pub use group_chat::{GroupChat, GroupChatBuilder};
pub use loop_state::{LoopState, Phase, RunOutcome, RunStatus};
pub use observer::{EngineObserver, NoopObserver, TracingObserver};
pub use orchestrator::{ConversationEngine, DEFAULT_COMPLETER_TIMEOUT};
pub use participant::{
    contains_token, strip_token, Agent, AgentRole, TerminationPredicate, TurnContext,
    TERMINATION_TOKEN,
};
pub use transition::{SpeakerChooser, SpeakerSelection, TransitionGraph, TransitionKind};
