//! Append-only conversation memory.
//!
//! Each answered question becomes one [`ConversationTurn`] carrying the
//! sections that were retrieved for it, so a host can render any past turn
//! without pairing messages and documents by position.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::Section;

/// One answered question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// Arrival position in the session, starting at 0. Assigned on append.
    pub order: u64,
    /// The question as the user asked it.
    pub question: String,
    /// The raw model answer.
    pub answer: String,
    /// The sections retrieved for this question, most similar first.
    pub retrieved: Vec<Section>,
}

impl ConversationTurn {
    /// Create a turn. Its `order` is set when it is appended to memory.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        retrieved: Vec<Section>,
    ) -> Self {
        Self { order: 0, question: question.into(), answer: answer.into(), retrieved }
    }
}

/// Ordered log of the turns in one session.
///
/// Unbounded by default. With `max_turns` set, the oldest turns are evicted
/// once the limit is exceeded; `order` keeps counting so it stays unique.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
    max_turns: Option<usize>,
    next_order: u64,
}

impl ConversationMemory {
    /// Create an unbounded memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory that retains at most `max_turns` turns.
    ///
    /// A cap of zero is raised to one so the latest turn is always retained.
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self { max_turns: max_turns.map(|max| max.max(1)), ..Self::default() }
    }

    /// Append a turn, stamping it with the next arrival order.
    pub fn append(&mut self, mut turn: ConversationTurn) -> &ConversationTurn {
        turn.order = self.next_order;
        self.next_order += 1;
        self.turns.push(turn);

        if let Some(max) = self.max_turns {
            if self.turns.len() > max {
                let excess = self.turns.len() - max;
                warn!(evicted = excess, max_turns = max, "evicting oldest conversation turns");
                self.turns.drain(..excess);
            }
        }

        &self.turns[self.turns.len() - 1]
    }

    /// Retained turns in arrival order.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of retained turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been retained.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Total number of turns ever appended, including evicted ones.
    pub fn total_turns(&self) -> u64 {
        self.next_order
    }
}
