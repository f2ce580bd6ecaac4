//! Host context handed to event handlers, tools, and commands.

use std::sync::Arc;

use crate::session::{Entry, EntryId, EntryStore};
use crate::ui::UiHandle;

/// Context window accounting reported by the driving agent, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextUsage {
    pub tokens: u64,
    pub context_window: u64,
}

/// Read-only view of the session log.
///
/// Extensions read the branch through this view; appending goes through
/// the registration surface so the host keeps ownership of the write
/// path.
#[derive(Clone)]
pub struct SessionView {
    store: Arc<EntryStore>,
}

impl SessionView {
    pub(crate) fn new(store: Arc<EntryStore>) -> Self {
        Self { store }
    }

    /// Snapshot of the current branch, root first.
    pub fn get_branch(&self) -> Vec<Entry> {
        self.store.get_branch()
    }

    pub fn get_leaf_id(&self) -> Option<EntryId> {
        self.store.get_leaf_id()
    }
}

/// Capabilities available to every handler, tool, and command.
#[derive(Clone)]
pub struct HostContext {
    pub session: SessionView,
    pub ui: Arc<dyn UiHandle>,
    /// False in batch mode. UI calls short-circuit to their neutral
    /// defaults when unset; extensions that need a real answer must
    /// check this first.
    pub has_ui: bool,
    context_usage: Option<ContextUsage>,
}

impl HostContext {
    pub(crate) fn new(
        store: Arc<EntryStore>,
        ui: Arc<dyn UiHandle>,
        context_usage: Option<ContextUsage>,
    ) -> Self {
        let has_ui = ui.has_ui();
        Self {
            session: SessionView::new(store),
            ui,
            has_ui,
            context_usage,
        }
    }

    pub fn context_usage(&self) -> Option<ContextUsage> {
        self.context_usage
    }
}
