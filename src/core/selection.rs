//! Selection state and the derived tri-state of tree nodes.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::node::Node;

/// The derived checkbox state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckState {
    pub checked: bool,
    pub indeterminate: bool,
}

impl CheckState {
    pub const UNCHECKED: CheckState = CheckState {
        checked: false,
        indeterminate: false,
    };
    pub const CHECKED: CheckState = CheckState {
        checked: true,
        indeterminate: false,
    };
    pub const INDETERMINATE: CheckState = CheckState {
        checked: false,
        indeterminate: true,
    };

    pub fn for_file(selected: bool) -> Self {
        if selected {
            Self::CHECKED
        } else {
            Self::UNCHECKED
        }
    }

    /// Summarizes `selected` out of `total` eligible descendants.
    pub fn from_counts(total: usize, selected: usize) -> Self {
        if total == 0 || selected == 0 {
            Self::UNCHECKED
        } else if selected >= total {
            Self::CHECKED
        } else {
            Self::INDETERMINATE
        }
    }
}

/// Which files are included and which directories are open.
///
/// Both sets keep insertion order; the selection order drives the order of
/// compiled documents. The sets sit behind `Arc`s so snapshots share them
/// until one side changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_paths: Arc<IndexSet<String>>,
    pub expanded_paths: Arc<IndexSet<String>>,
}

impl SelectionState {
    pub fn is_selected(&self, path: &str) -> bool {
        self.selected_paths.contains(path)
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded_paths.contains(path)
    }

    /// Copy-on-write access to the selected set.
    pub fn selected_mut(&mut self) -> &mut IndexSet<String> {
        Arc::make_mut(&mut self.selected_paths)
    }

    /// Copy-on-write access to the expanded set.
    pub fn expanded_mut(&mut self) -> &mut IndexSet<String> {
        Arc::make_mut(&mut self.expanded_paths)
    }

    pub(crate) fn shares_storage_with(&self, other: &SelectionState) -> bool {
        Arc::ptr_eq(&self.selected_paths, &other.selected_paths)
            && Arc::ptr_eq(&self.expanded_paths, &other.expanded_paths)
    }
}

/// Computes the tri-state of `node` by walking its subtree.
///
/// Pure in `node` and `selected`; [`FileTree::check_state`] gives the same
/// answer through the index.
///
/// [`FileTree::check_state`]: super::tree_builder::FileTree::check_state
pub fn compute_check_state(node: &Node, selected: &IndexSet<String>) -> CheckState {
    match node {
        Node::File {
            path, is_text_file, ..
        } => CheckState::for_file(*is_text_file && selected.contains(path)),
        Node::Directory { .. } => {
            let (total, count) = count_eligible(node, selected);
            CheckState::from_counts(total, count)
        }
    }
}

/// Returns `(eligible files, selected eligible files)` below `node`.
fn count_eligible(node: &Node, selected: &IndexSet<String>) -> (usize, usize) {
    match node {
        Node::File {
            path,
            is_text_file: true,
            ..
        } => (1, usize::from(selected.contains(path))),
        Node::File { .. } => (0, 0),
        Node::Directory { children, .. } => children
            .iter()
            .map(|child| count_eligible(child, selected))
            .fold((0, 0), |(t, s), (ct, cs)| (t + ct, s + cs)),
    }
}
