//! Conversation engine
//!
//! Drives a [`GroupChat`] turn by turn: the current speaker produces a
//! message, the engine checks termination and the round budget, routes tool
//! calls to the proxy and otherwise picks the next speaker from the
//! transition graph. Runs are strictly sequential and share nothing but the
//! tool registry.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::agent::conversation::Conversation;
use crate::agent::group_chat::GroupChat;
use crate::agent::loop_state::{LoopState, Phase, RunOutcome, RunStatus};
use crate::agent::observer::{EngineObserver, NoopObserver};
use crate::agent::participant::{strip_token, AgentRole, TurnContext};
use crate::agent::transition::SpeakerSelection;
use crate::core::{Config, ConferError, Result};
use crate::llm::Completer;
use crate::tools::ToolRegistry;

/// Ceiling for a single completer call
pub const DEFAULT_COMPLETER_TIMEOUT: Duration = Duration::from_secs(120);

/// Speaker of user messages in chats without a proxy
const USER_SPEAKER: &str = "user";

/// Result of speaker selection
enum NextSpeaker {
    Agent(String),
    Halt(RunStatus),
}

/// Runs conversations over a shared completer and tool registry
pub struct ConversationEngine {
    /// Completer for agents without their own
    completer: Arc<dyn Completer>,
    /// Tool registry (read-only after startup)
    registry: Arc<ToolRegistry>,
    observer: Arc<dyn EngineObserver>,
    completer_timeout: Duration,
}

impl ConversationEngine {
    /// Create an engine with no-op observability and the default timeout
    pub fn new(completer: Arc<dyn Completer>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            completer,
            registry,
            observer: Arc::new(NoopObserver),
            completer_timeout: DEFAULT_COMPLETER_TIMEOUT,
        }
    }

    /// Create an engine using the configured completer timeout
    pub fn from_config(
        config: &Config,
        completer: Arc<dyn Completer>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self::new(completer, registry).with_completer_timeout(config.completer_timeout())
    }

    /// Attach observability hooks
    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_completer_timeout(mut self, timeout: Duration) -> Self {
        self.completer_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one conversation to a terminal state
    ///
    /// `history` holds the session's prior user messages. Completer
    /// failures, timeouts and cancellation are errors; every other ending
    /// is a [`RunOutcome`] whose status tells callers whether the answer is
    /// complete.
    #[tracing::instrument(skip_all, fields(entry = chat.entry(), max_rounds = chat.max_rounds()))]
    pub async fn run(
        &self,
        chat: &GroupChat,
        opening: &str,
        history: &[String],
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let result = self.drive(chat, opening, history, cancel).await;
        self.observer.run_finished(result.as_ref());
        result
    }

    async fn drive(
        &self,
        chat: &GroupChat,
        opening: &str,
        history: &[String],
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let mut conversation = Conversation::new();
        let user = chat.proxy().map(|p| p.name()).unwrap_or(USER_SPEAKER);
        conversation.seed_history(user, history);

        // a proxy entry relays the opening as its first turn
        let entry_relays = chat
            .agent(chat.entry())
            .is_some_and(|agent| agent.role() == AgentRole::Proxy);
        if !entry_relays {
            conversation.open(user, opening);
        }

        let ctx = TurnContext {
            completer: &self.completer,
            registry: &self.registry,
            chat,
            opening,
            timeout: self.completer_timeout,
            cancel,
        };

        let mut state = LoopState::new(chat.max_rounds());
        state.start();
        let mut speaker = chat.entry().to_string();

        while state.should_continue() {
            if cancel.is_cancelled() {
                state.finish(Phase::Failed);
                tracing::debug!(round = state.round, "run cancelled");
                return Err(ConferError::Cancelled);
            }

            let agent = chat
                .agent(&speaker)
                .ok_or_else(|| ConferError::AgentNotFound(speaker.clone()))?;

            self.observer.turn_started(state.round + 1, &speaker);
            let message = match agent.produce_turn(&conversation, &ctx).await {
                Ok(message) => message,
                Err(e) => {
                    state.finish(Phase::Failed);
                    return Err(e);
                }
            };
            state.next_round();

            // tool results answer to the agent that issued the call
            let judge = if message.is_tool_result() {
                conversation
                    .last()
                    .and_then(|issuer| chat.agent(&issuer.speaker))
                    .unwrap_or(agent)
            } else {
                agent
            };
            let terminal = judge.is_terminal(&message);
            let tool_call = message.is_tool_call();

            let message = conversation.push(message);
            self.observer.turn_finished(state.round, message);

            if terminal {
                return Ok(self.finish(&mut state, RunStatus::Completed, chat, conversation));
            }
            if state.exhausted() {
                return Ok(self.finish(&mut state, RunStatus::RoundExhausted, chat, conversation));
            }

            if tool_call {
                if let Some(proxy) = chat.proxy() {
                    speaker = proxy.name().to_string();
                    continue;
                }
                tracing::warn!(agent = %speaker, "tool call without a proxy; selecting normally");
            }

            match self.select_next(chat, &speaker, &conversation, &ctx).await {
                Ok(NextSpeaker::Agent(next)) => {
                    tracing::debug!(from = %speaker, to = %next, "speaker selected");
                    speaker = next;
                }
                Ok(NextSpeaker::Halt(status)) => {
                    return Ok(self.finish(&mut state, status, chat, conversation));
                }
                Err(e) => {
                    state.finish(Phase::Failed);
                    return Err(e);
                }
            }
        }

        // max_rounds >= 1 is enforced when the chat is built
        Ok(self.finish(&mut state, RunStatus::RoundExhausted, chat, conversation))
    }

    async fn select_next(
        &self,
        chat: &GroupChat,
        current: &str,
        conversation: &Conversation,
        ctx: &TurnContext<'_>,
    ) -> Result<NextSpeaker> {
        let participants = chat.participant_names();
        let candidates = chat.graph().candidates(current, &participants);

        if candidates.is_empty() {
            return Ok(NextSpeaker::Halt(RunStatus::NoEligibleSpeaker {
                after: current.to_string(),
            }));
        }

        match chat.selection() {
            SpeakerSelection::Explicit(chooser) => {
                let next = chooser.next_speaker(current, conversation);
                match chat.graph().check_explicit(current, &next, &participants) {
                    Ok(()) => Ok(NextSpeaker::Agent(next)),
                    Err(ConferError::DisallowedTransition { from, to }) => {
                        Ok(NextSpeaker::Halt(RunStatus::DisallowedTransition { from, to }))
                    }
                    Err(e) => Err(e),
                }
            }
            SpeakerSelection::Auto => {
                let first = candidates[0].to_string();
                let manager = match chat.manager() {
                    Some(manager) if candidates.len() > 1 => manager,
                    _ => return Ok(NextSpeaker::Agent(first)),
                };

                let reply = manager.choose_speaker(&candidates, conversation, ctx).await?;
                if candidates.contains(&reply.as_str()) {
                    Ok(NextSpeaker::Agent(reply))
                } else {
                    tracing::debug!(%reply, fallback = %first, "manager reply is not a candidate");
                    Ok(NextSpeaker::Agent(first))
                }
            }
        }
    }

    fn finish(
        &self,
        state: &mut LoopState,
        status: RunStatus,
        chat: &GroupChat,
        conversation: Conversation,
    ) -> RunOutcome {
        state.finish(status.phase());

        let last = conversation.last().map(|m| m.text()).unwrap_or_default();
        let content = match status {
            RunStatus::Completed => strip_token(&last, chat.termination_token()),
            _ => last,
        };

        RunOutcome {
            status,
            content,
            rounds: conversation.rounds(),
            messages: conversation.into_turns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::participant::{Agent, TerminationPredicate};
    use crate::agent::transition::TransitionGraph;
    use crate::core::{Message, MessageContent, ToolDefinition};
    use crate::llm::{ScriptedCompleter, ScriptedReply};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn weather_registry(calls: Arc<AtomicUsize>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_fn(
            ToolDefinition::function(
                "fetch_weather_data",
                "Fetch the current weather for a given ZIP code.",
                json!({
                    "type": "object",
                    "properties": {"zip_code": {"type": "string"}},
                    "required": ["zip_code"]
                }),
            ),
            move |_args| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"location": "Lithia Springs", "temperature": 21.0, "condition": "Sunny"}))
                }
            },
        );
        registry
    }

    fn weather_chat(max_rounds: usize) -> GroupChat {
        GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(
                Agent::assistant("weather_agent", "Report the weather.")
                    .with_tools(["fetch_weather_data"]),
            )
            .graph(
                TransitionGraph::allowed()
                    .edge("user_proxy", ["weather_agent"])
                    .edge("weather_agent", ["user_proxy"]),
            )
            .max_rounds(max_rounds)
            .build()
            .unwrap()
    }

    fn engine(completer: Arc<ScriptedCompleter>, registry: ToolRegistry) -> ConversationEngine {
        ConversationEngine::new(completer, Arc::new(registry))
    }

    #[tokio::test]
    async fn test_tool_round_trip_then_terminate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let completer = Arc::new(
            ScriptedCompleter::new()
                .then_tool("fetch_weather_data", json!({"zip_code": "30041"}))
                .then_text("It is sunny and 21C in Lithia Springs. TERMINATE"),
        );
        let engine = engine(completer.clone(), weather_registry(calls.clone()));

        let outcome = engine
            .run(&weather_chat(10), "weather for 30041", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.content, "It is sunny and 21C in Lithia Springs.");
        assert_eq!(outcome.rounds, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(completer.call_count(), 2);

        let speakers: Vec<_> = outcome.messages.iter().map(|m| m.speaker.as_str()).collect();
        assert_eq!(
            speakers,
            vec!["user_proxy", "weather_agent", "user_proxy", "weather_agent"]
        );
        assert!(outcome.messages[2].is_tool_result());
        assert_eq!(completer.calls()[0].tools, vec!["fetch_weather_data"]);
    }

    #[tokio::test]
    async fn test_round_exhaustion_returns_last_message_unmodified() {
        let completer = Arc::new(ScriptedCompleter::repeating(crate::llm::Completion::text(
            "Could you share your ZIP code?",
        )));
        let engine = engine(completer.clone(), ToolRegistry::new());

        let outcome = engine
            .run(&weather_chat(4), "weather please", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::RoundExhausted);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.rounds, 4);
        assert_eq!(outcome.content, "Could you share your ZIP code?");
        // the proxy turns make no completer calls
        assert_eq!(completer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_successor_set_halts() {
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("csr_agent", "Help the customer."))
            .graph(
                TransitionGraph::allowed()
                    .edge("user_proxy", ["csr_agent"])
                    .edge("csr_agent", Vec::<String>::new()),
            )
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_text("Noted."));

        let outcome = engine(completer, ToolRegistry::new())
            .run(&chat, "hello", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.status,
            RunStatus::NoEligibleSpeaker { after: "csr_agent".into() }
        );
        assert_eq!(outcome.content, "Noted.");
        assert_eq!(outcome.rounds, 2);
    }

    #[tokio::test]
    async fn test_explicit_disallowed_transition_is_not_substituted() {
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("finance_agent", ""))
            .agent(Agent::assistant("csr_agent", ""))
            .graph(TransitionGraph::allowed().edge("user_proxy", ["finance_agent"]))
            .selection(SpeakerSelection::explicit(|_: &str, _: &Conversation| {
                "csr_agent".to_string()
            }))
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new());

        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&chat, "balance for C001", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.status,
            RunStatus::DisallowedTransition {
                from: "user_proxy".into(),
                to: "csr_agent".into()
            }
        );
        assert_eq!(completer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_tool_result() {
        let completer = Arc::new(
            ScriptedCompleter::new()
                .then_tool("fetch_stock_price", json!({"symbol": "ACME"}))
                .then_text("I cannot look that up. TERMINATE"),
        );

        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&weather_chat(10), "price of ACME", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        let result = &outcome.messages[2];
        assert!(result.is_tool_result());
        assert!(result.text().contains("Unknown tool: fetch_stock_price"));
        // the assistant saw the failure on its next turn
        let second = &completer.calls()[1];
        assert!(second.history.iter().any(|m| m.text().contains("Unknown tool")));
    }

    #[tokio::test]
    async fn test_tool_result_judged_by_issuing_agent() {
        let mut registry = ToolRegistry::new();
        registry.register_fn(
            ToolDefinition::function("send_text_message", "Send a text.", json!({"type": "object"})),
            |_args| async { Ok(json!("Message sent to the customer: done TERMINATE.")) },
        );
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("csr_agent", "").with_tools(["send_text_message"]))
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_tool("send_text_message", json!({})));

        let outcome = engine(completer, registry)
            .run(&chat, "text me", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.content, "Message sent to the customer: done");
        assert_eq!(outcome.rounds, 3);
    }

    #[tokio::test]
    async fn test_manager_reply_outside_candidates_falls_back_to_first() {
        let manager_completer = Arc::new(ScriptedCompleter::new().then_text("billing_agent"));
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("finance_agent", ""))
            .agent(Agent::assistant("csr_agent", ""))
            .graph(
                TransitionGraph::allowed()
                    .edge("user_proxy", ["csr_agent", "finance_agent"])
                    .edge("finance_agent", ["user_proxy"])
                    .edge("csr_agent", ["user_proxy"]),
            )
            .manager(Agent::manager("chat_manager", "Pick a role.").with_completer(manager_completer.clone()))
            .max_rounds(2)
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_text("Looking into it."));

        let outcome = engine(completer, ToolRegistry::new())
            .run(&chat, "what do I owe?", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.messages[1].speaker, "finance_agent");
        assert_eq!(manager_completer.call_count(), 1);
        let prompt = &manager_completer.calls()[0];
        assert!(prompt.directive.contains("finance_agent: assistant"));
        assert!(prompt
            .history
            .last()
            .unwrap()
            .text()
            .contains("[finance_agent, csr_agent]"));
    }

    #[tokio::test]
    async fn test_manager_choice_is_honoured() {
        let manager_completer = Arc::new(ScriptedCompleter::new().then_text("  csr_agent\n"));
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("finance_agent", ""))
            .agent(Agent::assistant("csr_agent", ""))
            .graph(TransitionGraph::allowed().edge("user_proxy", ["finance_agent", "csr_agent"]))
            .manager(Agent::manager("chat_manager", "").with_completer(manager_completer))
            .max_rounds(2)
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_text("Sending a text."));

        let outcome = engine(completer, ToolRegistry::new())
            .run(&chat, "text my balance", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.messages[1].speaker, "csr_agent");
    }

    #[tokio::test]
    async fn test_completer_failure_is_fatal() {
        let completer = Arc::new(ScriptedCompleter::new().then(ScriptedReply::Fail("boom".into())));
        let err = engine(completer, ToolRegistry::new())
            .run(&weather_chat(10), "weather", &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConferError::Completer(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completer_timeout() {
        let completer = Arc::new(ScriptedCompleter::new().then(ScriptedReply::Hang));
        let err = engine(completer, ToolRegistry::new())
            .with_completer_timeout(Duration::from_secs(120))
            .run(&weather_chat(10), "weather", &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConferError::CompleterTimeout(d) if d == Duration::from_secs(120)));
    }

    #[tokio::test]
    async fn test_cancellation_abandons_in_flight_call() {
        let completer = Arc::new(ScriptedCompleter::new().then(ScriptedReply::Hang));
        let engine = engine(completer.clone(), ToolRegistry::new());
        let cancel = CancellationToken::new();
        let chat = weather_chat(10);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = engine.run(&chat, "weather", &[], &cancel).await.unwrap_err();
        assert!(matches!(err, ConferError::Cancelled));
        assert_eq!(completer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_history_is_seeded_before_the_opening() {
        let completer = Arc::new(ScriptedCompleter::new().then_text("Still sunny. TERMINATE"));
        let history = vec!["weather for 30041".to_string()];

        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&weather_chat(10), "and now?", &history, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.messages.len(), 2);
        let seen: Vec<String> = completer.calls()[0].history.iter().map(Message::text).collect();
        assert_eq!(seen, vec!["weather for 30041", "and now?"]);
    }

    #[tokio::test]
    async fn test_proxy_opening_never_terminates() {
        let completer = Arc::new(ScriptedCompleter::new().then_text("Done. TERMINATE"));
        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&weather_chat(10), "how do I terminate my plan?", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(completer.call_count(), 1);
        assert_eq!(outcome.content, "Done.");
    }

    #[tokio::test]
    async fn test_observer_sees_every_turn() {
        #[derive(Default)]
        struct Counter {
            started: AtomicUsize,
            finished: AtomicUsize,
            runs: AtomicUsize,
        }
        impl EngineObserver for Counter {
            fn turn_started(&self, _round: usize, _speaker: &str) {
                self.started.fetch_add(1, Ordering::SeqCst);
            }
            fn turn_finished(&self, _round: usize, _message: &Message) {
                self.finished.fetch_add(1, Ordering::SeqCst);
            }
            fn run_finished(&self, _outcome: std::result::Result<&RunOutcome, &ConferError>) {
                self.runs.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Counter::default());
        let completer = Arc::new(ScriptedCompleter::new().then_text("Sunny. TERMINATE"));
        engine(completer, ToolRegistry::new())
            .with_observer(counter.clone())
            .run(&weather_chat(10), "weather", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(counter.started.load(Ordering::SeqCst), 2);
        assert_eq!(counter.finished.load(Ordering::SeqCst), 2);
        assert_eq!(counter.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_assistant_entry_receives_the_opening() {
        let chat = GroupChat::builder()
            .agent(Agent::assistant("weather_agent", "Report the weather."))
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_text("Sunny in 30041. TERMINATE"));
        let history = vec!["hello".to_string()];

        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&chat, "weather for 30041", &history, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.rounds, 1);
        let seen: Vec<String> = completer.calls()[0].history.iter().map(Message::text).collect();
        assert_eq!(seen, vec!["hello", "weather for 30041"]);
        assert_eq!(outcome.messages[0].speaker, "user");
        assert_eq!(outcome.messages[0].role, crate::core::Role::User);
    }

    #[tokio::test]
    async fn test_entry_override_skips_the_proxy_opening_turn() {
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("weather_agent", "Report the weather."))
            .entry("weather_agent")
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_text("Sunny. TERMINATE"));

        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&chat, "weather for 30041", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 1);
        let first = &completer.calls()[0].history[0];
        assert_eq!(first.speaker, "user_proxy");
        assert_eq!(first.text(), "weather for 30041");
    }

    #[tokio::test]
    async fn test_disallowed_graph_routes_around_forbidden_edges() {
        let chat = GroupChat::builder()
            .agent(Agent::proxy("user_proxy"))
            .agent(Agent::assistant("finance_agent", ""))
            .agent(Agent::assistant("csr_agent", ""))
            .graph(TransitionGraph::disallowed().edge("user_proxy", ["finance_agent"]))
            .build()
            .unwrap();
        let completer = Arc::new(ScriptedCompleter::new().then_text("Reminder sent. TERMINATE"));

        let outcome = engine(completer.clone(), ToolRegistry::new())
            .run(&chat, "remind CUST001", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        let speakers: Vec<_> = outcome.messages.iter().map(|m| m.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["user_proxy", "csr_agent"]);
        assert_eq!(completer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_reach_the_assistant() {
        let calls = Arc::new(AtomicUsize::new(0));
        let completer = Arc::new(
            ScriptedCompleter::new()
                .then_tool("fetch_weather_data", json!({"zip": "30041"}))
                .then_text("Which ZIP code should I use? TERMINATE"),
        );

        let outcome = engine(completer.clone(), weather_registry(calls.clone()))
            .run(&weather_chat(10), "weather for 30041", &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let result = &outcome.messages[2];
        assert!(result.is_tool_result());
        assert!(result.text().contains("missing required keys: zip_code"));

        let retry = &completer.calls()[1];
        assert!(retry
            .history
            .iter()
            .any(|m| m.is_tool_result() && m.text().contains("Invalid arguments for tool 'fetch_weather_data'")));
    }

    #[tokio::test]
    async fn test_cancellation_during_tool_dispatch() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut registry = ToolRegistry::new();
        registry.register_fn(
            ToolDefinition::function("fetch_weather_data", "Fetch weather.", json!({"type": "object"})),
            move |_args| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    std::future::pending::<()>().await;
                    Ok(json!(null))
                }
            },
        );
        let completer = Arc::new(
            ScriptedCompleter::new()
                .then_tool("fetch_weather_data", json!({}))
                .then_text("never reached TERMINATE"),
        );

        let err = engine(completer.clone(), registry)
            .run(&weather_chat(10), "weather for 30041", &[], &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ConferError::Cancelled));
        assert_eq!(completer.call_count(), 1);
    }

    #[test]
    fn test_custom_predicate_on_assistant() {
        let agent = Agent::assistant("weather_agent", "")
            .with_termination(TerminationPredicate::custom(|m| {
                matches!(&m.content, MessageContent::Text(t) if t.ends_with("Goodbye."))
            }));
        assert!(agent.is_terminal(&Message::assistant("weather_agent", "Goodbye.")));
    }
}
