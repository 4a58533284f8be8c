//! Owned conversation history.

use crate::llm::Content;

/// Ordered turns of one phase, oldest first. Sent in full on every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Content>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Content) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Content] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
