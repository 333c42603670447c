//! The application layer: snapshots, the operations on them and their owner.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod persistence;
pub mod state;
pub mod store;
pub mod tasks;
pub mod view_model;

use events::Action;
use helpers::with_stats;
use store::SnapshotStore;

use crate::core::{CoreError, FileTree};

/// Applies one action to the store. Returns `true` if a new snapshot was
/// published.
///
/// Root replacement goes through the store so a new generation starts;
/// content arriving this way is attributed to the current generation.
pub fn handle_action(store: &mut SnapshotStore, action: Action) -> bool {
    tracing::debug!("Handling action: {:?}", action);
    match action {
        Action::SetRoot { root } => {
            store.set_root(root.map(FileTree::from_root));
            true
        }
        Action::Reset => {
            store.reset();
            true
        }
        Action::SetFileContent { path, content } => {
            let generation = store.generation();
            store.set_file_content(generation, &path, &content)
        }
        other => store.dispatch(with_stats(|state| other.apply(state))),
    }
}

/// Parses a JSON message from the presentation layer and applies it.
pub fn handle_message(store: &mut SnapshotStore, message: &str) -> Result<bool, CoreError> {
    let action = Action::from_json(message)?;
    Ok(handle_action(store, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CheckState, FileRecord};

    fn loaded_store() -> SnapshotStore {
        let mut store = SnapshotStore::in_memory();
        let tree = FileTree::build(&[
            FileRecord::new("r/a/x.txt", 1, true),
            FileRecord::new("r/a/y.txt", 1, true),
        ])
        .unwrap();
        store.set_root(Some(tree));
        store
    }

    #[test]
    fn test_handle_message_updates_selection_and_stats() {
        let mut store = loaded_store();

        let changed = handle_message(
            &mut store,
            r#"{"command": "toggle_directory_selection", "payload": {"path": "r/a"}}"#,
        )
        .unwrap();

        assert!(changed);
        let state = store.state();
        assert_eq!(state.check_state("r/a"), Some(CheckState::CHECKED));
        assert_eq!(state.stats.selected_count, 2);
    }

    #[test]
    fn test_content_message_counts_towards_tokens() {
        let mut store = loaded_store();
        handle_message(&mut store, r#"{"command": "select_all_eligible"}"#).unwrap();
        handle_message(
            &mut store,
            r#"{"command": "set_file_content", "payload": {"path": "r/a/x.txt", "content": "12345678"}}"#,
        )
        .unwrap();

        assert_eq!(store.state().stats.estimated_tokens, 2);
    }

    #[test]
    fn test_set_root_action_starts_new_generation() {
        let mut store = loaded_store();
        let before = store.generation();

        handle_action(&mut store, Action::SetRoot { root: None });

        assert!(store.generation() > before);
        assert!(store.state().root.is_none());
    }

    #[test]
    fn test_malformed_message_is_an_error() {
        let mut store = loaded_store();
        assert!(matches!(
            handle_message(&mut store, "{"),
            Err(CoreError::Serialization(_))
        ));
    }
}
