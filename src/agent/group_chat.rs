//! Group chat definition
//!
//! A [`GroupChat`] is the static shape of a conversation: participants,
//! transition graph, manager, round budget and selection policy. It is
//! validated once when built and shared read-only by every run.

use crate::agent::participant::{Agent, AgentRole, TERMINATION_TOKEN};
use crate::agent::transition::{SpeakerSelection, TransitionGraph};
use crate::core::{ConferError, Result};

/// Validated conversation shape
#[derive(Debug, Clone)]
pub struct GroupChat {
    agents: Vec<Agent>,
    graph: TransitionGraph,
    manager: Option<Agent>,
    entry: String,
    max_rounds: usize,
    selection: SpeakerSelection,
    termination_token: String,
}

/// Builder for creating group chats
pub struct GroupChatBuilder {
    agents: Vec<Agent>,
    graph: TransitionGraph,
    manager: Option<Agent>,
    entry: Option<String>,
    max_rounds: usize,
    selection: SpeakerSelection,
    termination_token: String,
}

impl GroupChatBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            graph: TransitionGraph::open(),
            manager: None,
            entry: None,
            max_rounds: 10,
            selection: SpeakerSelection::Auto,
            termination_token: TERMINATION_TOKEN.to_string(),
        }
    }

    /// Add a participant; declaration order is the fallback order
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Set the transition graph
    pub fn graph(mut self, graph: TransitionGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Set the speaker-selecting manager
    pub fn manager(mut self, manager: Agent) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Agent that speaks first
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Set max rounds
    pub fn max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn selection(mut self, selection: SpeakerSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Token stripped from a completed answer
    pub fn termination_token(mut self, token: impl Into<String>) -> Self {
        self.termination_token = token.into();
        self
    }

    /// Validate and build the group chat
    pub fn build(self) -> Result<GroupChat> {
        if self.agents.is_empty() {
            return Err(ConferError::config("group chat needs at least one agent"));
        }
        if self.max_rounds == 0 {
            return Err(ConferError::config("max_rounds must be at least 1"));
        }

        let mut names: Vec<&str> = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            if names.contains(&agent.name()) {
                return Err(ConferError::config(format!(
                    "duplicate agent name '{}'",
                    agent.name()
                )));
            }
            if agent.role() == AgentRole::Manager {
                return Err(ConferError::config(format!(
                    "manager '{}' cannot be a participant",
                    agent.name()
                )));
            }
            names.push(agent.name());
        }

        if let Some(manager) = &self.manager {
            if manager.role() != AgentRole::Manager {
                return Err(ConferError::config(format!(
                    "'{}' is not a manager",
                    manager.name()
                )));
            }
        }

        let has_proxy = self.agents.iter().any(|a| a.role() == AgentRole::Proxy);
        if !has_proxy {
            if let Some(agent) = self.agents.iter().find(|a| !a.tools().is_empty()) {
                return Err(ConferError::config(format!(
                    "agent '{}' has tools but no proxy can execute them",
                    agent.name()
                )));
            }
        }

        self.graph.validate(&names)?;

        let entry = match self.entry {
            Some(entry) if names.contains(&entry.as_str()) => entry,
            Some(entry) => return Err(ConferError::AgentNotFound(entry)),
            None => self
                .agents
                .iter()
                .find(|a| a.role() == AgentRole::Proxy)
                .unwrap_or(&self.agents[0])
                .name()
                .to_string(),
        };

        Ok(GroupChat {
            agents: self.agents,
            graph: self.graph,
            manager: self.manager,
            entry,
            max_rounds: self.max_rounds,
            selection: self.selection,
            termination_token: self.termination_token,
        })
    }
}

impl Default for GroupChatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupChat {
    /// Create a builder
    pub fn builder() -> GroupChatBuilder {
        GroupChatBuilder::new()
    }

    /// Get a participant by name
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Participant names in declaration order
    pub fn participant_names(&self) -> Vec<&str> {
        self.agents.iter().map(Agent::name).collect()
    }

    pub fn graph(&self) -> &TransitionGraph {
        &self.graph
    }

    pub fn manager(&self) -> Option<&Agent> {
        self.manager.as_ref()
    }

    /// Name of the first speaker
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn selection(&self) -> &SpeakerSelection {
        &self.selection
    }

    /// First proxy participant, the executor of tool calls
    pub fn proxy(&self) -> Option<&Agent> {
        self.agents.iter().find(|a| a.role() == AgentRole::Proxy)
    }

    pub fn termination_token(&self) -> &str {
        &self.termination_token
    }
}
