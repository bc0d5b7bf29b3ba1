use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::corpus::passage::PassageSource;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Constraint set applied before generation.
///
/// A tagged variant, not a subclass hierarchy: both policies run the same
/// turn state machine and differ only in the system prompt and the
/// citation requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Answer strictly from cited passages.
    Guideline,
    /// Domain-specialist heuristics allowed beyond the passages.
    Specialist,
}

/// A source citation linking an answer claim to a retrieved passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub passage_id: String,
    pub source: PassageSource,
    /// First characters of the cited passage, for display.
    pub excerpt: String,
    pub relevance: f32,
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    /// Passages cited by this turn; always a subset of the turn's
    /// retrieval result.
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            citations: Vec::new(),
            confidence: None,
        }
    }

    pub fn assistant(
        text: impl Into<String>,
        citations: Vec<Citation>,
        confidence: f32,
    ) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            citations,
            confidence: Some(confidence),
        }
    }

    /// Cited passage ids in citation order.
    pub fn cited_ids(&self) -> Vec<&str> {
        self.citations.iter().map(|c| c.passage_id.as_str()).collect()
    }
}

/// An ordered sequence of turns under a caller-supplied identity.
/// No expiry is applied here; session lifecycle belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub turns: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new(id: Uuid) -> Self {
        Self { id, turns: Vec::new() }
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}
