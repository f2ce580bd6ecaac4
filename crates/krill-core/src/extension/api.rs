//! Extension-facing traits and handles.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::HostContext;
use crate::session::{replay, Entry, EntryId, EntryStore};

/// An installable extension.
///
/// `setup` runs once at install time and registers everything the
/// extension contributes: event handlers, tools, commands, and claims
/// on custom entry types. State shared between those registrations
/// lives in `Arc`s the extension clones into them.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    fn setup(&self, api: &mut super::ExtensionApi<'_>) -> anyhow::Result<()>;
}

/// A human-invoked command.
#[async_trait]
pub trait Command: Send + Sync {
    async fn run(&self, args: &str, ctx: &HostContext) -> anyhow::Result<()>;
}

/// Write handle for one claimed custom entry type.
///
/// Claiming the type at setup is what makes two extensions colliding on
/// a name an install-time error instead of silent shadowing. The handle
/// also carries the replay side so both directions agree on the type
/// name.
#[derive(Clone)]
pub struct CustomEntryHandle {
    custom_type: String,
    store: Arc<EntryStore>,
}

impl CustomEntryHandle {
    pub(crate) fn new(custom_type: String, store: Arc<EntryStore>) -> Self {
        Self { custom_type, store }
    }

    pub fn custom_type(&self) -> &str {
        &self.custom_type
    }

    /// Append a snapshot of the extension's state after the current
    /// leaf.
    pub fn append<T: Serialize>(&self, data: &T) -> anyhow::Result<EntryId> {
        let value = serde_json::to_value(data)?;
        Ok(self.store.append_custom(&self.custom_type, value)?)
    }

    /// The last snapshot on the branch, if any deserializes. Later
    /// entries shadow earlier ones.
    pub fn latest<T: DeserializeOwned>(&self, branch: &[Entry]) -> Option<T> {
        replay::latest_custom_data(branch, &self.custom_type)
    }
}
