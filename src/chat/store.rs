use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::types::{ChatTurn, Conversation};

/// In-memory conversation registry.
///
/// Exists to enforce one invariant: turns for a single conversation id are
/// processed in submission order. Each conversation sits behind its own
/// `tokio::sync::Mutex`, which queues waiters fairly, so two concurrent
/// turns on the same id are serialized while distinct ids proceed
/// independently. The outer std mutex only guards the map itself and is
/// never held across an await.
#[derive(Default)]
pub struct ConversationStore {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<Conversation>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the handle for a conversation, creating it on first use.
    pub fn handle(&self, id: Uuid) -> Arc<tokio::sync::Mutex<Conversation>> {
        let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Conversation::new(id))))
            .clone()
    }

    /// Snapshot of a conversation's turns; empty when the id is unknown.
    pub async fn history(&self, id: Uuid) -> Vec<ChatTurn> {
        let handle = {
            let map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            map.get(&id).cloned()
        };

        match handle {
            Some(conv) => conv.lock().await.turns.clone(),
            None => Vec::new(),
        }
    }

    pub fn conversation_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
