//! Defines the serializable actions a presentation layer sends to the store.

use serde::Deserialize;

use super::commands;
use super::state::AppState;
use crate::core::{FileTree, Node};

/// A message received from the presentation layer, e.g. as
/// `{"command": "toggle_file_selection", "payload": {"path": "...", "selected": true}}`.
///
/// Each variant maps onto one operation of [`commands`].
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "command", content = "payload", rename_all = "snake_case")]
pub enum Action {
    SetRoot {
        root: Option<Node>,
    },
    SetFileContent {
        path: String,
        content: String,
    },
    ToggleFileSelection {
        path: String,
        selected: bool,
    },
    ToggleDirectorySelection {
        path: String,
    },
    BulkSelect {
        #[serde(default)]
        to_select: Vec<String>,
        #[serde(default)]
        to_deselect: Vec<String>,
    },
    ToggleExpansion {
        path: String,
    },
    BulkSetExpansion {
        #[serde(default)]
        to_expand: Vec<String>,
        #[serde(default)]
        to_collapse: Vec<String>,
    },
    ExpandAll,
    CollapseAll,
    SelectAllEligible,
    DeselectAllEligible,
    Reset,
    RecomputeStats,
}

impl Action {
    /// Parses an action from its JSON form.
    pub fn from_json(message: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(message)
    }

    /// The pure transform for this action.
    pub fn apply(self, state: &AppState) -> AppState {
        match self {
            Action::SetRoot { root } => commands::set_root(root.map(FileTree::from_root)),
            Action::SetFileContent { path, content } => {
                commands::set_file_content(state, &path, content)
            }
            Action::ToggleFileSelection { path, selected } => {
                commands::toggle_file_selection(state, &path, selected)
            }
            Action::ToggleDirectorySelection { path } => {
                commands::toggle_directory_selection(state, &path)
            }
            Action::BulkSelect {
                to_select,
                to_deselect,
            } => commands::bulk_select(state, to_select, to_deselect),
            Action::ToggleExpansion { path } => commands::toggle_expansion(state, &path),
            Action::BulkSetExpansion {
                to_expand,
                to_collapse,
            } => commands::bulk_set_expansion(state, to_expand, to_collapse),
            Action::ExpandAll => commands::set_all_expanded(state, true),
            Action::CollapseAll => commands::set_all_expanded(state, false),
            Action::SelectAllEligible => commands::select_all_eligible(state),
            Action::DeselectAllEligible => commands::deselect_all_eligible(state),
            Action::Reset => commands::reset(state),
            Action::RecomputeStats => commands::recompute_stats(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actions_deserialize_from_tagged_json() {
        let action = Action::from_json(
            r#"{"command": "toggle_file_selection", "payload": {"path": "r/a.txt", "selected": true}}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::ToggleFileSelection {
                path: "r/a.txt".to_string(),
                selected: true,
            }
        );

        let unit: Action = serde_json::from_value(json!({"command": "select_all_eligible"})).unwrap();
        assert_eq!(unit, Action::SelectAllEligible);

        let bulk: Action = serde_json::from_value(json!({
            "command": "bulk_select",
            "payload": {"to_deselect": ["r/a.txt"]}
        }))
        .unwrap();
        assert_eq!(
            bulk,
            Action::BulkSelect {
                to_select: vec![],
                to_deselect: vec!["r/a.txt".to_string()],
            }
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Action::from_json(r#"{"command": "format_disk"}"#).is_err());
    }

    #[test]
    fn test_set_root_action_builds_index() {
        let root: Node = serde_json::from_value(json!({
            "kind": "directory",
            "name": "r",
            "path": "r",
            "children": [
                {"kind": "file", "name": "a.txt", "path": "r/a.txt", "size": 3, "is_text_file": true}
            ]
        }))
        .unwrap();

        let state = Action::SetRoot { root: Some(root) }.apply(&AppState::default());
        let state = Action::SelectAllEligible.apply(&state);

        assert!(state.selection.is_selected("r/a.txt"));
    }
}
