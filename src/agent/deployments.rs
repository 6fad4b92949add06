//! Built-in deployments
//!
//! Maps a request's agent kind to the group chat that serves it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::agent::group_chat::GroupChat;
use crate::agent::participant::{Agent, TerminationPredicate};
use crate::agent::prompts;
use crate::agent::transition::{SpeakerSelection, TransitionGraph};
use crate::core::{Config, ConferError, Result};
use crate::llm::Completer;

/// Deployment requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// Proxy plus a single weather assistant
    Weather,
    /// Managed group chat of finance and customer support assistants
    Finance,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Weather => "weather",
            AgentKind::Finance => "finance",
        }
    }

    pub fn all() -> [AgentKind; 2] {
        [AgentKind::Weather, AgentKind::Finance]
    }
}

impl FromStr for AgentKind {
    type Err = ConferError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weather" => Ok(AgentKind::Weather),
            "finance" => Ok(AgentKind::Finance),
            _ => Err(ConferError::AgentNotFound(s.to_string())),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the group chat for each [`AgentKind`]
#[derive(Clone)]
pub struct DeploymentCatalog {
    weather_rounds: usize,
    finance_rounds: usize,
    termination_token: String,
    manager_completer: Option<Arc<dyn Completer>>,
}

impl DeploymentCatalog {
    pub fn new(config: &Config) -> Self {
        Self {
            weather_rounds: config.weather.max_rounds,
            finance_rounds: config.finance.max_rounds,
            termination_token: config.engine.termination_token.clone(),
            manager_completer: None,
        }
    }

    /// Completer used by the finance chat manager for speaker selection
    pub fn with_manager_completer(mut self, completer: Arc<dyn Completer>) -> Self {
        self.manager_completer = Some(completer);
        self
    }

    /// Override the round budget of every deployment
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.weather_rounds = max_rounds;
        self.finance_rounds = max_rounds;
        self
    }

    pub fn build(&self, kind: AgentKind) -> Result<GroupChat> {
        match kind {
            AgentKind::Weather => self.weather(),
            AgentKind::Finance => self.finance(),
        }
    }

    fn termination(&self) -> TerminationPredicate {
        TerminationPredicate::token(&self.termination_token)
    }

    fn weather(&self) -> Result<GroupChat> {
        GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(
                Agent::assistant("weather_agent", prompts::WEATHER_AGENT)
                    .with_tools(["extract_zip_code", "fetch_weather_data"])
                    .with_termination(self.termination()),
            )
            .graph(
                TransitionGraph::allowed()
                    .edge("user_proxy", ["weather_agent"])
                    .edge("weather_agent", ["user_proxy"]),
            )
            .entry("user_proxy")
            .max_rounds(self.weather_rounds)
            .termination_token(&self.termination_token)
            .build()
    }

    fn finance(&self) -> Result<GroupChat> {
        let mut manager = Agent::manager("chat_manager", prompts::GROUP_CHAT_MANAGER);
        if let Some(completer) = &self.manager_completer {
            manager = manager.with_completer(completer.clone());
        }

        GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(
                Agent::assistant("finance_agent", prompts::FINANCE_AGENT)
                    .with_tools([
                        "extract_customer_id",
                        "fetch_customer_details",
                        "fetch_customer_balance",
                        "fetch_invoices",
                    ])
                    .with_termination(self.termination()),
            )
            .agent(
                Agent::assistant("csr_agent", prompts::CSR_AGENT)
                    .with_tools(["send_text_message"])
                    .with_termination(self.termination()),
            )
            .graph(
                TransitionGraph::allowed()
                    .edge("user_proxy", ["finance_agent"])
                    .edge("finance_agent", ["user_proxy", "csr_agent"])
                    .edge("csr_agent", Vec::<String>::new()),
            )
            .manager(manager)
            .selection(SpeakerSelection::Auto)
            .entry("user_proxy")
            .max_rounds(self.finance_rounds)
            .termination_token(&self.termination_token)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("weather".parse::<AgentKind>().unwrap(), AgentKind::Weather);
        assert_eq!("Finance".parse::<AgentKind>().unwrap(), AgentKind::Finance);
        assert_eq!(" WEATHER ".parse::<AgentKind>().unwrap(), AgentKind::Weather);

        let err = "travel".parse::<AgentKind>().unwrap_err();
        assert_eq!(err.to_string(), "Agent 'travel', not available at this point.");
    }

    #[test]
    fn test_weather_deployment() {
        let chat = DeploymentCatalog::new(&Config::default())
            .build(AgentKind::Weather)
            .unwrap();
        assert_eq!(chat.participant_names(), vec!["user_proxy", "weather_agent"]);
        assert_eq!(chat.max_rounds(), 10);
        assert_eq!(chat.entry(), "user_proxy");
        assert!(chat.manager().is_none());
    }

    #[test]
    fn test_finance_deployment() {
        let chat = DeploymentCatalog::new(&Config::default())
            .build(AgentKind::Finance)
            .unwrap();
        let names = chat.participant_names();
        assert_eq!(names, vec!["user_proxy", "finance_agent", "csr_agent"]);
        assert_eq!(chat.max_rounds(), 20);
        assert_eq!(chat.manager().unwrap().name(), "chat_manager");
        assert_eq!(
            chat.graph().candidates("finance_agent", &names),
            vec!["user_proxy", "csr_agent"]
        );
        assert!(chat.graph().candidates("csr_agent", &names).is_empty());
        assert_eq!(chat.agent("csr_agent").unwrap().tools(), ["send_text_message"]);
    }

    #[test]
    fn test_round_override() {
        let chat = DeploymentCatalog::new(&Config::default())
            .with_max_rounds(3)
            .build(AgentKind::Finance)
            .unwrap();
        assert_eq!(chat.max_rounds(), 3);
    }
}
