//! Contains helper functions to reduce boilerplate code in other `app` modules.

use super::commands::recompute_stats;
use super::state::AppState;

/// Wraps a transform so the resulting snapshot also carries fresh stats.
///
/// Stats stay derived data: any transform dispatched from outside the
/// store goes through this so `selected_count` and `estimated_tokens` never
/// lag behind the selection.
pub fn with_stats<F>(transform: F) -> impl FnOnce(&AppState) -> AppState
where
    F: FnOnce(&AppState) -> AppState,
{
    move |state| recompute_stats(&transform(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::commands;
    use crate::core::{FileRecord, FileTree};

    #[test]
    fn test_with_stats_recomputes_after_transform() {
        let tree = FileTree::build(&[FileRecord::new("r/a.txt", 1, true)]).unwrap();
        let state = commands::set_root(Some(tree));
        let state = commands::set_file_content(&state, "r/a.txt", "hello");

        let next = with_stats(|s| commands::toggle_file_selection(s, "r/a.txt", true))(&state);

        assert_eq!(next.stats.selected_count, 1);
        assert_eq!(next.stats.estimated_tokens, 2);
    }
}
