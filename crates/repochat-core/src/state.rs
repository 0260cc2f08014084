//! UI-agnostic chat message types
//!
//! The message store is shared by every view; it knows nothing about how the
//! messages get rendered.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Ordered, append-only list of chat turns. Only `clear` removes messages.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    last_id: u128,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, stamping it with an id taken from the current time.
    /// Ids are strictly increasing within the store even when two messages
    /// land in the same millisecond.
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) -> &ChatMessage {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let id = now.max(self.last_id + 1);
        self.last_id = id;

        self.messages.push(ChatMessage {
            id: id.to_string(),
            role,
            content: content.into(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut store = MessageStore::new();
        for i in 0..50 {
            store.push(ChatRole::User, format!("message {}", i));
        }

        let ids: Vec<u128> = store
            .as_slice()
            .iter()
            .map(|m| m.id.parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_keeps_insertion_order() {
        let mut store = MessageStore::new();
        store.push(ChatRole::User, "question");
        store.push(ChatRole::Assistant, "answer");

        let roles: Vec<ChatRole> = store.as_slice().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
        assert_eq!(store.last().unwrap().content, "answer");
    }

    #[test]
    fn test_clear_empties_but_ids_keep_increasing() {
        let mut store = MessageStore::new();
        let first: u128 = store.push(ChatRole::User, "a").id.parse().unwrap();
        store.clear();
        assert!(store.is_empty());

        let second: u128 = store.push(ChatRole::User, "b").id.parse().unwrap();
        assert!(second > first);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
