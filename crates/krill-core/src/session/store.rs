//! Append-only, branching entry store.
//!
//! Entries live in an arena indexed by id; branches are parent-pointer
//! chains, so forking and switching branches are pointer updates rather
//! than copies. Appends serialize on a single writer lock to keep the
//! leaf pointer consistent; reads take a snapshot and may run concurrently
//! with writers.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::entry::{CustomEntry, Entry, EntryId, EntryKind, MessageEntry, MessageRole};
use super::SessionError;

/// Parent selector for [`EntryStore::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendParent {
    /// Append after the current leaf (or as root when the tree is empty).
    Current,
    /// Append after a specific existing entry.
    At(EntryId),
}

/// Session metadata kept alongside the entry tree.
#[derive(Debug, Clone)]
pub struct SessionHeader {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

struct TreeState {
    /// Arena of entries; an entry's id is its index.
    entries: Vec<Entry>,
    leaf: Option<EntryId>,
}

impl TreeState {
    fn contains(&self, id: EntryId) -> bool {
        (id.0 as usize) < self.entries.len()
    }
}

/// The session's entry tree and its current-leaf pointer.
pub struct EntryStore {
    header: SessionHeader,
    state: RwLock<TreeState>,
}

impl EntryStore {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            header: SessionHeader {
                id: Uuid::new_v4(),
                title: title.into(),
                created_at: Utc::now(),
            },
            state: RwLock::new(TreeState {
                entries: Vec::new(),
                leaf: None,
            }),
        }
    }

    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    /// Append a new entry and advance the current leaf to it.
    ///
    /// The append and the leaf advancement happen under one writer lock,
    /// so two concurrent appends from the same leaf serialize instead of
    /// overwriting each other's pointer.
    pub fn append(&self, parent: AppendParent, kind: EntryKind) -> Result<EntryId, SessionError> {
        let mut state = self.state.write();

        let parent_id = match parent {
            AppendParent::Current => state.leaf,
            AppendParent::At(id) => {
                if !state.contains(id) {
                    return Err(SessionError::InvalidParent { id });
                }
                Some(id)
            }
        };

        let id = EntryId(state.entries.len() as u64);
        state.entries.push(Entry {
            id,
            parent_id,
            created_at: Utc::now(),
            kind,
        });
        state.leaf = Some(id);
        Ok(id)
    }

    /// Append a conversation message after the current leaf.
    pub fn append_message(
        &self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<EntryId, SessionError> {
        self.append(
            AppendParent::Current,
            EntryKind::Message(MessageEntry {
                role,
                content: content.into(),
            }),
        )
    }

    /// Append a typed custom entry after the current leaf.
    pub fn append_custom(
        &self,
        custom_type: impl Into<String>,
        data: Value,
    ) -> Result<EntryId, SessionError> {
        self.append(
            AppendParent::Current,
            EntryKind::Custom(CustomEntry {
                custom_type: custom_type.into(),
                data,
            }),
        )
    }

    /// Create a new leaf as a child of `at`, moving the current leaf to
    /// it. The new branch shares every entry up to and including `at`
    /// with the branch that produced it; nothing pre-existing is mutated.
    pub fn fork(&self, at: EntryId) -> Result<EntryId, SessionError> {
        let mut state = self.state.write();
        if !state.contains(at) {
            return Err(SessionError::EntryNotFound { id: at });
        }

        let id = EntryId(state.entries.len() as u64);
        state.entries.push(Entry {
            id,
            parent_id: Some(at),
            created_at: Utc::now(),
            kind: EntryKind::Fork { forked_from: at },
        });
        state.leaf = Some(id);
        Ok(id)
    }

    /// Move the current leaf to an existing entry without appending.
    pub fn switch_branch(&self, leaf: EntryId) -> Result<(), SessionError> {
        let mut state = self.state.write();
        if !state.contains(leaf) {
            return Err(SessionError::EntryNotFound { id: leaf });
        }
        state.leaf = Some(leaf);
        Ok(())
    }

    pub fn get_leaf_id(&self) -> Option<EntryId> {
        self.state.read().leaf
    }

    /// The current branch, root first. A snapshot: appends that land
    /// after this returns are not reflected.
    pub fn get_branch(&self) -> Vec<Entry> {
        let state = self.state.read();
        let mut branch = Vec::new();
        let mut cursor = state.leaf;
        while let Some(id) = cursor {
            let entry = &state.entries[id.0 as usize];
            branch.push(entry.clone());
            cursor = entry.parent_id;
        }
        branch.reverse();
        branch
    }

    /// Root-first path ending at `leaf`, which need not be the current
    /// leaf. Used to inspect sibling branches without switching.
    pub fn branch_from(&self, leaf: EntryId) -> Result<Vec<Entry>, SessionError> {
        let state = self.state.read();
        if !state.contains(leaf) {
            return Err(SessionError::EntryNotFound { id: leaf });
        }
        let mut branch = Vec::new();
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let entry = &state.entries[id.0 as usize];
            branch.push(entry.clone());
            cursor = entry.parent_id;
        }
        branch.reverse();
        Ok(branch)
    }

    /// Total number of entries across all branches.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}
