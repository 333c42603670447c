//! Defines the immutable application snapshot.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::output::{compile, CompileOptions, CompiledOutput};
use crate::core::{CheckState, FileContents, FileTree, SelectionState};

/// Derived numbers shown to the user; recomputed explicitly by
/// [`recompute_stats`](super::commands::recompute_stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub selected_count: usize,
    pub estimated_tokens: usize,
}

/// One immutable value of the full application state.
///
/// Every substructure sits behind an `Arc`: cloning a snapshot is cheap, and
/// a transform only copies the part it changes (`Arc::make_mut`), leaving the
/// previous snapshot untouched.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// The loaded tree, or `None` before a directory is chosen.
    pub root: Option<Arc<FileTree>>,
    pub selection: SelectionState,
    pub file_contents: Arc<FileContents>,
    pub stats: Stats,
}

impl AppState {
    pub fn tree(&self) -> Option<&FileTree> {
        self.root.as_deref()
    }

    /// Copy-on-write access to the content map.
    pub fn contents_mut(&mut self) -> &mut FileContents {
        Arc::make_mut(&mut self.file_contents)
    }

    /// `true` when `other` is this very snapshot: same shared storage and stats.
    pub fn same_as(&self, other: &AppState) -> bool {
        let same_root = match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_root
            && self.selection.shares_storage_with(&other.selection)
            && Arc::ptr_eq(&self.file_contents, &other.file_contents)
            && self.stats == other.stats
    }

    pub fn check_state(&self, path: &str) -> Option<CheckState> {
        self.tree()?
            .check_state(path, &self.selection.selected_paths)
    }

    /// Eligible files whose content has not resolved yet.
    pub fn pending_paths(&self) -> Vec<String> {
        self.tree()
            .map(|tree| {
                tree.eligible_files()
                    .iter()
                    .filter(|p| !self.file_contents.contains_key(*p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn compile(&self, options: CompileOptions) -> CompiledOutput {
        compile(
            self.tree(),
            &self.selection.selected_paths,
            &self.file_contents,
            options,
        )
    }
}
