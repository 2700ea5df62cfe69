//! Bounded per-conversation turn history.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Who produced a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human asking questions.
    User,
    /// The assistant's replies.
    Assistant,
}

/// One utterance in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The speaker.
    pub role: Role,
    /// The utterance text.
    pub content: String,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), created_at: Utc::now() }
    }

    /// Create an assistant turn stamped now.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), created_at: Utc::now() }
    }
}

/// Recent turn history keyed by conversation identifier, bounded per
/// conversation.
///
/// The store owns all conversation state; the orchestrator holds no copy of
/// its own. The bound exists purely to cap prompt size: once a conversation
/// exceeds the window, the oldest turns are evicted first. There is no
/// persistence beyond process lifetime.
///
/// Appends take the write lock, so concurrent requests against the same
/// conversation serialize in arrival order — last-appended-wins. Callers
/// that need stricter per-conversation ordering must avoid overlapping
/// requests for one identifier.
#[derive(Debug)]
pub struct ConversationStore {
    window: usize,
    conversations: RwLock<HashMap<String, VecDeque<Turn>>>,
}

impl ConversationStore {
    /// Create a store that keeps at most `window` turns per conversation.
    pub fn new(window: usize) -> Self {
        Self { window, conversations: RwLock::new(HashMap::new()) }
    }

    /// The configured per-conversation turn bound.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a turn, evicting the oldest turns beyond the window.
    pub async fn append(&self, conversation_id: &str, turn: Turn) {
        let mut conversations = self.conversations.write().await;
        let turns = conversations.entry(conversation_id.to_string()).or_default();
        turns.push_back(turn);
        while turns.len() > self.window {
            turns.pop_front();
        }
    }

    /// Return the conversation's turns in chronological order,
    /// most recent last. Unknown conversations yield an empty history.
    pub async fn history(&self, conversation_id: &str) -> Vec<Turn> {
        let conversations = self.conversations.read().await;
        conversations
            .get(conversation_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop a conversation's history entirely.
    pub async fn clear(&self, conversation_id: &str) {
        self.conversations.write().await.remove(conversation_id);
    }
}
