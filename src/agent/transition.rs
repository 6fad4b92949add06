//! Speaker transition graph and selection policy

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::agent::conversation::Conversation;
use crate::core::{ConferError, Result};

/// Meaning of the edges in a [`TransitionGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Edges list who may speak next
    Allowed,
    /// Edges list who may not speak next
    Disallowed,
}

/// Directed graph over agent names encoding who may speak after whom
///
/// The graph is consulted, never mutated, during a run.
#[derive(Debug, Clone)]
pub struct TransitionGraph {
    kind: TransitionKind,
    edges: HashMap<String, Vec<String>>,
}

impl TransitionGraph {
    /// Empty graph with the given semantics
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            edges: HashMap::new(),
        }
    }

    /// Graph of permitted successors
    pub fn allowed() -> Self {
        Self::new(TransitionKind::Allowed)
    }

    /// Graph of forbidden successors
    pub fn disallowed() -> Self {
        Self::new(TransitionKind::Disallowed)
    }

    /// Anyone may follow anyone else
    pub fn open() -> Self {
        Self::disallowed()
    }

    /// Set the successor list of `from`
    pub fn edge<I, S>(mut self, from: impl Into<String>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edges
            .insert(from.into(), to.into_iter().map(Into::into).collect());
        self
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// Every name referenced by an edge must be a participant
    pub fn validate(&self, participants: &[&str]) -> Result<()> {
        for (from, targets) in &self.edges {
            for name in std::iter::once(from).chain(targets) {
                if !participants.contains(&name.as_str()) {
                    return Err(ConferError::config(format!(
                        "transition graph references unknown agent '{}'",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Permitted successors of `current`, in participant declaration order
    pub fn candidates<'a>(&self, current: &str, participants: &[&'a str]) -> Vec<&'a str> {
        let listed = self.edges.get(current);
        participants
            .iter()
            .copied()
            .filter(|name| {
                let in_edges = listed.is_some_and(|to| to.iter().any(|t| t == name));
                match self.kind {
                    TransitionKind::Allowed => in_edges,
                    TransitionKind::Disallowed => *name != current && !in_edges,
                }
            })
            .collect()
    }

    /// Validate an explicitly requested successor
    pub fn check_explicit(&self, current: &str, next: &str, participants: &[&str]) -> Result<()> {
        if self.candidates(current, participants).contains(&next) {
            Ok(())
        } else {
            Err(ConferError::DisallowedTransition {
                from: current.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Default for TransitionGraph {
    fn default() -> Self {
        Self::open()
    }
}

/// Caller-side choice of the next speaker for explicit selection
pub trait SpeakerChooser: Send + Sync {
    fn next_speaker(&self, current: &str, conversation: &Conversation) -> String;
}

impl<F> SpeakerChooser for F
where
    F: Fn(&str, &Conversation) -> String + Send + Sync,
{
    fn next_speaker(&self, current: &str, conversation: &Conversation) -> String {
        self(current, conversation)
    }
}

/// How the next speaker is picked
#[derive(Clone, Default)]
pub enum SpeakerSelection {
    /// Ask the manager; fall back to the first candidate
    #[default]
    Auto,
    /// The caller names the speaker; it must be a permitted successor
    Explicit(Arc<dyn SpeakerChooser>),
}

impl SpeakerSelection {
    pub fn explicit<C: SpeakerChooser + 'static>(chooser: C) -> Self {
        Self::Explicit(Arc::new(chooser))
    }
}

impl fmt::Debug for SpeakerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Explicit(_) => write!(f, "Explicit(..)"),
        }
    }
}
