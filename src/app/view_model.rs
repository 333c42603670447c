//! Responsible for transforming the `AppState` into a `ViewState` view model.
//!
//! The view model is what a presentation layer renders: a nested tree in
//! display order where every node already carries its check state,
//! expansion flag and whether it can be selected at all.

use serde::Serialize;

use super::state::{AppState, Stats};
use crate::core::{CheckState, FileTree, Node};

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ViewState {
    pub root: Option<TreeNode>,
    pub stats: Stats,
    pub pending_count: usize,
}

/// A serializable representation of a single node in the file tree for the UI.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    /// `false` for directories and non-text files.
    pub is_selectable: bool,
    /// Dotfiles are kept but rendered de-emphasized.
    pub is_hidden: bool,
    pub size: Option<u64>,
    pub check_state: CheckState,
    pub is_expanded: bool,
    pub children: Vec<TreeNode>,
}

/// Creates the complete `ViewState` from the current `AppState`.
pub fn generate_view_state(state: &AppState) -> ViewState {
    let root = state
        .tree()
        .map(|tree| build_tree_node(tree.root(), tree, state));
    let pending_count = state
        .tree()
        .map(|tree| {
            tree.eligible_files()
                .iter()
                .filter(|p| state.selection.is_selected(p))
                .filter(|p| !state.file_contents.contains_key(*p))
                .count()
        })
        .unwrap_or(0);

    ViewState {
        root,
        stats: state.stats,
        pending_count,
    }
}

fn build_tree_node(node: &Node, tree: &FileTree, state: &AppState) -> TreeNode {
    let check_state = tree
        .check_state(node.path(), &state.selection.selected_paths)
        .unwrap_or_default();
    let children = node
        .sorted_children()
        .into_iter()
        .map(|child| build_tree_node(child, tree, state))
        .collect();
    let size = match node {
        Node::File { size, .. } => Some(*size),
        Node::Directory { .. } => None,
    };

    TreeNode {
        name: node.name().to_string(),
        path: node.path().to_string(),
        is_directory: node.is_directory(),
        is_selectable: node.is_eligible(),
        is_hidden: node.is_hidden(),
        size,
        check_state,
        is_expanded: node.is_directory() && state.selection.is_expanded(node.path()),
        children,
    }
}

/// Paths of the rows currently on screen: the root plus every node whose
/// ancestors are all expanded, in display order.
pub fn visible_paths(state: &AppState) -> Vec<String> {
    let mut rows = Vec::new();
    if let Some(tree) = state.tree() {
        collect_visible(tree.root(), state, &mut rows);
    }
    rows
}

fn collect_visible(node: &Node, state: &AppState, rows: &mut Vec<String>) {
    rows.push(node.path().to_string());
    if node.is_directory() && state.selection.is_expanded(node.path()) {
        for child in node.sorted_children() {
            collect_visible(child, state, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::commands;
    use crate::core::FileRecord;

    fn state() -> AppState {
        let tree = FileTree::build(&[
            FileRecord::new("r/src/lib.rs", 10, true),
            FileRecord::new("r/src/util/mod.rs", 5, true),
            FileRecord::new("r/.env", 3, true),
            FileRecord::new("r/logo.png", 100, false),
        ])
        .unwrap();
        commands::set_root(Some(tree))
    }

    #[test]
    fn test_view_tree_carries_flags_in_display_order() {
        let state = commands::toggle_file_selection(&state(), "r/src/lib.rs", true);
        let view = generate_view_state(&state);
        let root = view.root.unwrap();

        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["src", ".env", "logo.png"]);

        let src = &root.children[0];
        assert_eq!(src.check_state, CheckState::INDETERMINATE);
        assert!(!src.is_selectable);

        let env = &root.children[1];
        assert!(env.is_hidden);
        assert!(env.is_selectable);

        let logo = &root.children[2];
        assert!(!logo.is_selectable);
        assert_eq!(logo.size, Some(100));
        assert_eq!(logo.check_state, CheckState::UNCHECKED);

        assert_eq!(view.pending_count, 1);
    }

    #[test]
    fn test_collapsed_ancestor_hides_rows_but_keeps_child_flag() {
        let state = commands::bulk_set_expansion(
            &state(),
            ["r", "r/src", "r/src/util"],
            std::iter::empty::<&str>(),
        );
        assert_eq!(
            visible_paths(&state),
            vec![
                "r",
                "r/src",
                "r/src/util",
                "r/src/util/mod.rs",
                "r/src/lib.rs",
                "r/.env",
                "r/logo.png",
            ]
        );

        let collapsed = commands::toggle_expansion(&state, "r/src");
        assert_eq!(
            visible_paths(&collapsed),
            vec!["r", "r/src", "r/.env", "r/logo.png"]
        );
        assert!(collapsed.selection.is_expanded("r/src/util"));

        let reopened = commands::toggle_expansion(&collapsed, "r/src");
        assert_eq!(visible_paths(&reopened), visible_paths(&state));
    }

    #[test]
    fn test_empty_state_has_no_rows() {
        let state = AppState::default();
        assert!(visible_paths(&state).is_empty());
        assert_eq!(generate_view_state(&state).root, None);
    }
}
