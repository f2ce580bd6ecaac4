//! Entry types for the session tree.
//!
//! Entries are immutable once appended. They form a tree under
//! `parent_id`; the store owns the only mutable pointer into the tree
//! (the current leaf).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an entry within a session.
///
/// Allocated monotonically by the store's arena. Stable for the lifetime
/// of the session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    ToolResult,
}

/// A role-tagged conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: MessageRole,
    pub content: String,
}

/// An extension-owned payload. The store never interprets `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEntry {
    pub custom_type: String,
    pub data: Value,
}

/// Payload of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// A conversation message.
    Message(MessageEntry),
    /// A typed custom entry written by an extension.
    Custom(CustomEntry),
    /// Marker created by a fork. Carries the entry the new branch was
    /// forked from; skipped by message assembly and custom-entry replay.
    Fork { forked_from: EntryId },
}

/// One immutable record in the session tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub parent_id: Option<EntryId>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl Entry {
    /// The custom entry payload, if this is a custom entry.
    pub fn as_custom(&self) -> Option<&CustomEntry> {
        match &self.kind {
            EntryKind::Custom(custom) => Some(custom),
            _ => None,
        }
    }

    /// The message payload, if this is a message entry.
    pub fn as_message(&self) -> Option<&MessageEntry> {
        match &self.kind {
            EntryKind::Message(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kind_serializes_with_kind_tag() {
        let entry = Entry {
            id: EntryId(3),
            parent_id: Some(EntryId(2)),
            created_at: Utc::now(),
            kind: EntryKind::Custom(CustomEntry {
                custom_type: "todo-state".to_string(),
                data: serde_json::json!({ "items": [] }),
            }),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "custom");
        assert_eq!(value["custom_type"], "todo-state");
        assert_eq!(value["id"], 3);
        assert_eq!(value["parent_id"], 2);
    }

    #[test]
    fn message_roles_round_trip() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::ToolResult] {
            let json = serde_json::to_string(&role).unwrap();
            let back: MessageRole = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
    }
}
