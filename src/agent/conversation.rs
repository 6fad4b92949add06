//! Conversation history for one orchestration run
//!
//! Append-only message log with a round counter. Seeded session history
//! sits in front of the run's own messages and does not count as rounds.

use crate::core::{Message, MessageContent, Role};

/// Message log of a single run
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Message history, seeded history first
    messages: Vec<Message>,
    /// Number of leading messages that came from session history
    seeded: usize,
    /// Messages produced during this run
    rounds: usize,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend prior user messages of the session
    ///
    /// Only valid before the run's first message; later calls are ignored.
    pub fn seed_history(&mut self, speaker: &str, prior: &[String]) {
        if !self.turns().is_empty() {
            tracing::warn!("ignoring session history seeded after the run started");
            return;
        }
        for content in prior {
            self.append(Message::new(
                speaker,
                Role::User,
                MessageContent::Text(content.clone()),
            ));
        }
        self.seeded = self.messages.len();
    }

    /// Append the request's opening message without counting a round
    ///
    /// Used when the entry agent does not relay the opening itself.
    pub fn open(&mut self, speaker: &str, content: &str) -> &Message {
        self.append(Message::new(
            speaker,
            Role::User,
            MessageContent::Text(content.to_string()),
        ))
    }

    /// Append a message produced during the run and count the round
    pub fn push(&mut self, message: Message) -> &Message {
        self.rounds += 1;
        self.append(message)
    }

    fn append(&mut self, mut message: Message) -> &Message {
        message.ordinal = self.messages.len();
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// All messages including seeded history
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages produced during this run
    pub fn turns(&self) -> &[Message] {
        &self.messages[self.seeded..]
    }

    /// Seeded history only
    pub fn history(&self) -> &[Message] {
        &self.messages[..self.seeded]
    }

    /// Latest message
    pub fn last(&self) -> Option<&Message> {
        self.turns().last()
    }

    /// Message before the latest one
    pub fn previous(&self) -> Option<&Message> {
        let turns = self.turns();
        turns.len().checked_sub(2).map(|i| &turns[i])
    }

    /// Number of rounds taken
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the conversation, returning the messages of this run
    pub fn into_turns(mut self) -> Vec<Message> {
        self.messages.split_off(self.seeded)
    }
}
