//! Branch replay for extension state.
//!
//! The store never interprets custom entries. An extension that keeps
//! in-memory state derived from the log rebuilds it by scanning the
//! current branch on session start, after a fork, and after a branch
//! switch. Later entries of the same custom type shadow earlier ones:
//! the last matching entry on the branch wins.
//!
//! This is a caller contract, not something the store enforces. The
//! helpers here exist so every extension replays the same way.

use serde::de::DeserializeOwned;

use super::entry::{CustomEntry, Entry};

/// All custom entries of `custom_type` on the branch, oldest first.
pub fn custom_entries<'a>(
    branch: &'a [Entry],
    custom_type: &'a str,
) -> impl Iterator<Item = &'a CustomEntry> {
    branch
        .iter()
        .filter_map(Entry::as_custom)
        .filter(move |custom| custom.custom_type == custom_type)
}

/// The last entry of `custom_type` on the branch, shadowing earlier ones.
pub fn latest_custom<'a>(branch: &'a [Entry], custom_type: &str) -> Option<&'a CustomEntry> {
    branch
        .iter()
        .rev()
        .filter_map(Entry::as_custom)
        .find(|custom| custom.custom_type == custom_type)
}

/// Deserialized data of the last entry of `custom_type` on the branch.
///
/// Returns `None` when the branch has no such entry or its data no
/// longer deserializes (an older schema, for example). Extensions should
/// treat `None` as "start fresh".
pub fn latest_custom_data<T: DeserializeOwned>(branch: &[Entry], custom_type: &str) -> Option<T> {
    let custom = latest_custom(branch, custom_type)?;
    serde_json::from_value(custom.data.clone()).ok()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::session::{EntryStore, MessageRole};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Marker {
        value: String,
    }

    #[test]
    fn latest_entry_of_a_type_shadows_earlier_ones() {
        let store = EntryStore::new("test");
        store
            .append_custom("type-x", json!({ "value": "A" }))
            .unwrap();
        store
            .append_custom("type-y", json!({ "value": "B" }))
            .unwrap();
        store
            .append_custom("type-x", json!({ "value": "C" }))
            .unwrap();

        let branch = store.get_branch();
        let latest: Marker = latest_custom_data(&branch, "type-x").unwrap();
        assert_eq!(latest.value, "C");

        let all: Vec<_> = custom_entries(&branch, "type-x").collect();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn replay_sees_only_entries_on_the_current_branch() {
        let store = EntryStore::new("test");
        store
            .append_custom("type-x", json!({ "value": "A" }))
            .unwrap();
        let fork_point = store.get_leaf_id().unwrap();
        store
            .append_custom("type-x", json!({ "value": "B" }))
            .unwrap();

        // The sibling branch never saw "B".
        store.fork(fork_point).unwrap();
        let branch = store.get_branch();
        let latest: Marker = latest_custom_data(&branch, "type-x").unwrap();
        assert_eq!(latest.value, "A");
    }

    #[test]
    fn missing_or_unreadable_data_replays_as_none() {
        let store = EntryStore::new("test");
        store.append_message(MessageRole::User, "hello").unwrap();
        store.append_custom("type-x", json!("not-a-marker")).unwrap();

        let branch = store.get_branch();
        assert!(latest_custom_data::<Marker>(&branch, "absent").is_none());
        assert!(latest_custom_data::<Marker>(&branch, "type-x").is_none());
    }
}
