//! Conversation turns and the append-only store that holds them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Assistant,
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    id: String,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Ordered, in-memory turn history for one session
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn has_human_turn(&self) -> bool {
        self.turns.iter().any(|t| t.role == Role::Human)
    }

    /// Remove the last turn if it is an assistant turn.
    ///
    /// Only called by the session runtime when the turn processor reports
    /// that it answered in place of that turn.
    pub(crate) fn discard_trailing_assistant(&mut self) -> Option<Turn> {
        if self.turns.last().is_some_and(Turn::is_assistant) {
            self.turns.pop()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut store = ConversationStore::new();
        store.append(Turn::human("hi"));
        store.append(Turn::assistant("hello"));
        store.append(Turn::human("hi"));

        let contents: Vec<_> = store.all().iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["hi", "hello", "hi"]);
        assert_eq!(store.all().len(), 3);
        assert!(store.has_human_turn());
    }

    #[test]
    fn test_turns_get_unique_ids() {
        let a = Turn::human("same");
        let b = Turn::human("same");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_discard_trailing_assistant_only_removes_assistant() {
        let mut store = ConversationStore::new();
        store.append(Turn::human("question"));
        assert!(store.discard_trailing_assistant().is_none());
        assert_eq!(store.all().len(), 1);

        store.append(Turn::assistant("stale"));
        let removed = store.discard_trailing_assistant().unwrap();
        assert_eq!(removed.content(), "stale");
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].role(), Role::Human);
    }

    #[test]
    fn test_empty_store() {
        let mut store = ConversationStore::new();
        assert!(store.all().is_empty());
        assert!(!store.has_human_turn());
        assert!(store.discard_trailing_assistant().is_none());
    }

    #[test]
    fn test_turn_serializes_role_snake_case() {
        let json = serde_json::to_value(Turn::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "ok");
        assert!(json["id"].is_string());
    }
}
