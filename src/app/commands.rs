//! The mutation engine: every operation a user (or automation) can apply.
//!
//! Each function is a pure transformation from one snapshot to the next. The
//! input snapshot is never modified; a targeted path that does not resolve in
//! the current tree turns the operation into a no-op (a stale reference is
//! logged, not reported).

use std::sync::Arc;

use super::state::{AppState, Stats};
use crate::core::output::estimate_tokens;
use crate::core::FileTree;

fn stale_reference(state: &AppState, operation: &str, path: &str) -> AppState {
    if state.root.is_none() {
        tracing::debug!("{} ignored for '{}': no directory loaded", operation, path);
    } else {
        tracing::warn!("{} ignored: '{}' is not in the current tree", operation, path);
    }
    state.clone()
}

/// Replaces the tree wholesale and clears everything derived from the old one.
pub fn set_root(tree: Option<FileTree>) -> AppState {
    AppState {
        root: tree.map(Arc::new),
        ..AppState::default()
    }
}

/// Equivalent to `set_root(None)`; the store also clears persisted data.
pub fn reset(_state: &AppState) -> AppState {
    set_root(None)
}

/// Records the extracted text of one eligible file.
pub fn set_file_content(state: &AppState, path: &str, text: impl Into<Arc<str>>) -> AppState {
    if !state.tree().is_some_and(|t| t.is_eligible_file(path)) {
        return stale_reference(state, "set_file_content", path);
    }
    let mut next = state.clone();
    next.contents_mut().insert(path.to_string(), text.into());
    next
}

/// Adds or removes a single eligible file.
pub fn toggle_file_selection(state: &AppState, path: &str, selected: bool) -> AppState {
    if !state.tree().is_some_and(|t| t.is_eligible_file(path)) {
        return stale_reference(state, "toggle_file_selection", path);
    }
    if state.selection.is_selected(path) == selected {
        return state.clone();
    }

    let mut next = state.clone();
    if selected {
        next.selection.selected_mut().insert(path.to_string());
    } else {
        next.selection.selected_mut().shift_remove(path);
    }
    next
}

/// Checks every eligible descendant, or unchecks them all if the directory
/// is already fully checked. An indeterminate directory becomes checked.
pub fn toggle_directory_selection(state: &AppState, path: &str) -> AppState {
    let Some(tree) = state.tree() else {
        return stale_reference(state, "toggle_directory_selection", path);
    };
    let Some(files) = tree.eligible_files_under(path) else {
        return stale_reference(state, "toggle_directory_selection", path);
    };
    if files.is_empty() {
        return state.clone();
    }

    let fully_checked = files.iter().all(|f| state.selection.is_selected(f));
    let mut next = state.clone();
    let selected = next.selection.selected_mut();
    if fully_checked {
        for file in files {
            selected.shift_remove(file);
        }
    } else {
        selected.extend(files.iter().cloned());
    }
    next
}

/// Applies both lists in one transition. A path present in both lists ends
/// up deselected.
pub fn bulk_select(
    state: &AppState,
    to_select: impl IntoIterator<Item = impl AsRef<str>>,
    to_deselect: impl IntoIterator<Item = impl AsRef<str>>,
) -> AppState {
    let Some(tree) = state.tree() else {
        tracing::debug!("bulk_select ignored: no directory loaded");
        return state.clone();
    };

    let mut next = state.clone();
    for path in to_select {
        let path = path.as_ref();
        if tree.is_eligible_file(path) {
            if !next.selection.is_selected(path) {
                next.selection.selected_mut().insert(path.to_string());
            }
        } else {
            tracing::warn!("bulk_select skipped '{}': not an eligible file", path);
        }
    }
    for path in to_deselect {
        let path = path.as_ref();
        if next.selection.is_selected(path) {
            next.selection.selected_mut().shift_remove(path);
        }
    }
    next
}

/// Opens or closes one directory. Descendants keep their own flags.
pub fn toggle_expansion(state: &AppState, path: &str) -> AppState {
    if !state.tree().is_some_and(|t| t.is_directory(path)) {
        return stale_reference(state, "toggle_expansion", path);
    }

    let mut next = state.clone();
    let expanded = next.selection.expanded_mut();
    if !expanded.shift_remove(path) {
        expanded.insert(path.to_string());
    }
    next
}

/// Expands and collapses in one transition; collapse wins on overlap.
pub fn bulk_set_expansion(
    state: &AppState,
    to_expand: impl IntoIterator<Item = impl AsRef<str>>,
    to_collapse: impl IntoIterator<Item = impl AsRef<str>>,
) -> AppState {
    let Some(tree) = state.tree() else {
        tracing::debug!("bulk_set_expansion ignored: no directory loaded");
        return state.clone();
    };

    let mut next = state.clone();
    for path in to_expand {
        let path = path.as_ref();
        if !tree.is_directory(path) {
            tracing::warn!("bulk_set_expansion skipped '{}': not a directory", path);
        } else if !next.selection.is_expanded(path) {
            next.selection.expanded_mut().insert(path.to_string());
        }
    }
    for path in to_collapse {
        let path = path.as_ref();
        if next.selection.is_expanded(path) {
            next.selection.expanded_mut().shift_remove(path);
        }
    }
    next
}

/// Expands or collapses every directory in the tree.
pub fn set_all_expanded(state: &AppState, expand: bool) -> AppState {
    let Some(tree) = state.root.clone() else {
        return state.clone();
    };
    if expand {
        bulk_set_expansion(state, tree.directories(), std::iter::empty::<&str>())
    } else {
        bulk_set_expansion(state, std::iter::empty::<&str>(), tree.directories())
    }
}

pub fn select_all_eligible(state: &AppState) -> AppState {
    let Some(tree) = state.root.clone() else {
        return state.clone();
    };
    bulk_select(state, tree.eligible_files(), std::iter::empty::<&str>())
}

/// Empties the selection, stale entries included.
pub fn deselect_all_eligible(state: &AppState) -> AppState {
    if state.root.is_none() || state.selection.selected_paths.is_empty() {
        return state.clone();
    }
    let mut next = state.clone();
    next.selection.selected_paths = Arc::default();
    next
}

/// Recounts selected eligible files and the token estimate of their
/// resolved content. Pending content counts as zero.
pub fn recompute_stats(state: &AppState) -> AppState {
    let stats = match state.tree() {
        Some(tree) => {
            let selected = state
                .selection
                .selected_paths
                .iter()
                .filter(|p| tree.is_eligible_file(p));
            let (count, chars) = selected.fold((0, 0), |(count, chars), path| {
                let len = state
                    .file_contents
                    .get(path)
                    .map(|c| c.chars().count())
                    .unwrap_or(0);
                (count + 1, chars + len)
            });
            Stats {
                selected_count: count,
                estimated_tokens: estimate_tokens(chars),
            }
        }
        None => Stats::default(),
    };

    if stats == state.stats {
        return state.clone();
    }
    let mut next = state.clone();
    next.stats = stats;
    next
}
