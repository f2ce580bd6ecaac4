//! Branching session log.
//!
//! An append-only tree of immutable entries. Exactly one leaf is
//! "current"; the root-to-leaf path through it is the active branch.
//! Forking creates a sibling path from any existing entry without
//! copying or mutating history, and switching branches only moves the
//! leaf pointer.
//!
//! Extensions persist state into the log as typed custom entries and
//! rebuild it from the branch with the helpers in [`replay`].

pub mod entry;
pub mod replay;
pub mod store;

pub use entry::{CustomEntry, Entry, EntryId, EntryKind, MessageEntry, MessageRole};
pub use store::{AppendParent, EntryStore, SessionHeader};

use thiserror::Error;

/// Structural errors from the entry store. Always surfaced to the
/// caller, never swallowed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("parent entry {id} does not exist")]
    InvalidParent { id: EntryId },

    #[error("entry {id} does not exist")]
    EntryNotFound { id: EntryId },
}
