//! End-to-end scenarios: scan a real directory, select, resolve content
//! asynchronously, persist, restore and compile.

use context_pack::app::commands;
use context_pack::app::helpers::with_stats;
use context_pack::app::persistence::{JsonFilePersistence, MemoryPersistence};
use context_pack::app::store::SnapshotStore;
use context_pack::app::tasks::{apply_completions, ContentLoader};
use context_pack::config::AppConfig;
use context_pack::core::{
    CheckState, CompileOptions, DirectoryScanner, FileHandler, FileRecord, FileTree, RecordFilter,
};
use context_pack::utils::test_helpers::setup_test_logging;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Contains the test infrastructure.
mod helpers {
    use super::*;

    /// An isolated directory named `root` inside a temp dir.
    pub struct TestHarness {
        pub root_path: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub fn new() -> Self {
            setup_test_logging();
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().join("root");
            fs::create_dir_all(&root_path).expect("Failed to create root dir");
            Self {
                root_path,
                _temp_dir: temp_dir,
            }
        }

        pub fn create_file(&self, relative: &str, content: &[u8]) {
            let path = self.root_path.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dirs");
            }
            fs::write(path, content).expect("Failed to write file");
        }

        pub fn scan(&self) -> FileTree {
            let config = AppConfig::default();
            let records = DirectoryScanner::new(&config)
                .scan(&self.root_path)
                .expect("scan failed");
            let records = RecordFilter::from_config(&config)
                .expect("bad filter")
                .apply(records);
            FileTree::build(&records).expect("tree build failed")
        }

        pub fn state_dir(&self) -> PathBuf {
            self.root_path
                .parent()
                .map(|p| p.join("session"))
                .expect("temp dir has a parent")
        }

        /// Resolves every selected pending file through the real file handler.
        pub async fn resolve_selected(&self, store: &mut SnapshotStore) -> usize {
            let extractor = Arc::new(FileHandler::new(&self.root_path, 20));
            let (mut loader, mut events) = ContentLoader::new(extractor);
            let started = loader.spawn_pending_selected(store);
            let applied = apply_completions(store, &mut events, started).await;
            loader.shutdown().await.expect("loader shutdown failed");
            applied
        }
    }

    pub fn root_of(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

use helpers::TestHarness;

#[tokio::test]
async fn test_text_file_is_compiled_and_binary_is_not_selectable() {
    let harness = TestHarness::new();
    harness.create_file("readme.md", b"hello");
    harness.create_file("photo.png", &[0x89, b'P', b'N', b'G', 0, 0, 1, 2]);

    let mut store = SnapshotStore::in_memory();
    store.set_root(Some(harness.scan()));
    store.dispatch(with_stats(|s| {
        let s = commands::toggle_file_selection(s, "root/readme.md", true);
        commands::toggle_file_selection(&s, "root/photo.png", true)
    }));
    harness.resolve_selected(&mut store).await;

    let state = store.state();
    assert_eq!(state.stats.selected_count, 1);
    assert_eq!(state.stats.estimated_tokens, 2);

    let rendered = state.compile(CompileOptions::default()).render();
    assert_eq!(rendered.matches("<document path=\"root/readme.md\">").count(), 1);
    assert_eq!(rendered.matches("<document").count(), 1);
    assert!(rendered.contains("hello"));
    assert_eq!(helpers::root_of(&harness.root_path), "root");
}

#[tokio::test]
async fn test_unselected_subtree_is_omitted_from_tree() {
    let harness = TestHarness::new();
    harness.create_file("a/x.txt", b"x");
    harness.create_file("b/y.bin", &[0, 1, 2, 3]);

    let mut store = SnapshotStore::in_memory();
    store.set_root(Some(harness.scan()));
    store.dispatch(with_stats(|s| commands::toggle_file_selection(s, "root/a/x.txt", true)));
    harness.resolve_selected(&mut store).await;

    let compiled = store.state().compile(CompileOptions::default());
    assert_eq!(compiled.ascii_tree, "└── root\n    └── a\n        └── x.txt\n");
    assert_eq!(
        compiled.render(),
        "<folder-structure>\n└── root\n    └── a\n        └── x.txt\n</folder-structure>\n\n\
         <document path=\"root/a/x.txt\">\nx\n</document>\n"
    );
}

#[test]
fn test_directory_with_two_of_three_selected_becomes_checked() {
    let tree = FileTree::build(&[
        FileRecord::new("root/d/a.txt", 1, true),
        FileRecord::new("root/d/b.txt", 1, true),
        FileRecord::new("root/d/c.txt", 1, true),
    ])
    .unwrap();
    let mut store = SnapshotStore::in_memory();
    store.set_root(Some(tree));
    store.dispatch(|s| commands::bulk_select(s, ["root/d/a.txt", "root/d/b.txt"], [] as [&str; 0]));
    assert_eq!(store.state().check_state("root/d"), Some(CheckState::INDETERMINATE));

    store.dispatch(|s| commands::toggle_directory_selection(s, "root/d"));

    assert_eq!(store.state().check_state("root/d"), Some(CheckState::CHECKED));
    assert_eq!(store.state().selection.selected_paths.len(), 3);
}

#[tokio::test]
async fn test_session_survives_restart_on_disk() {
    let harness = TestHarness::new();
    harness.create_file("src/main.rs", b"fn main() {}\n");
    harness.create_file("src/lib.rs", b"pub fn lib() {}\n");
    harness.create_file("notes.txt", b"notes");

    {
        let mut store = SnapshotStore::new(JsonFilePersistence::new(harness.state_dir()));
        store.set_root(Some(harness.scan()));
        store.dispatch(with_stats(|s| {
            let s = commands::toggle_directory_selection(s, "root/src");
            commands::toggle_expansion(&s, "root/src")
        }));
        harness.resolve_selected(&mut store).await;
    }

    let store = SnapshotStore::restore(JsonFilePersistence::new(harness.state_dir()));
    let state = store.state();

    assert_eq!(
        state.selection.selected_paths.iter().collect::<Vec<_>>(),
        vec!["root/src/lib.rs", "root/src/main.rs"]
    );
    assert!(state.selection.is_expanded("root/src"));
    assert!(state.tree().is_some_and(|t| t.is_eligible_file("root/notes.txt")));
    assert_eq!(state.file_contents.len(), 2);
    assert!(state.pending_paths().contains(&"root/notes.txt".to_string()));

    let rendered = state.compile(CompileOptions::default()).render();
    assert!(rendered.contains("<document path=\"root/src/main.rs\">\nfn main() {}\n</document>"));
}

#[tokio::test]
async fn test_new_root_discards_completion_for_previous_root() {
    let old = TestHarness::new();
    old.create_file("a.txt", b"old contents");
    let new = TestHarness::new();
    new.create_file("a.txt", b"new contents");

    let mut store = SnapshotStore::in_memory();
    let old_generation = store.set_root(Some(old.scan()));
    let (mut loader, mut events) =
        ContentLoader::new(Arc::new(FileHandler::new(&old.root_path, 20)));
    loader.spawn_all(old_generation, vec!["root/a.txt".to_string()]);

    // The user picks another directory before the old read is applied.
    store.set_root(Some(new.scan()));
    let applied = apply_completions(&mut store, &mut events, 1).await;
    loader.shutdown().await.unwrap();

    assert_eq!(applied, 0);
    assert!(store.state().file_contents.is_empty());

    store.dispatch(commands::select_all_eligible);
    new.resolve_selected(&mut store).await;
    assert_eq!(
        store.state().file_contents.get("root/a.txt").map(|c| c.as_ref()),
        Some("new contents")
    );
}

#[test]
fn test_repeated_operations_are_idempotent() {
    let tree = FileTree::build(&[
        FileRecord::new("root/d/a.txt", 1, true),
        FileRecord::new("root/d/b.txt", 1, true),
        FileRecord::new("root/e.txt", 1, true),
    ])
    .unwrap();
    let mut store = SnapshotStore::new(MemoryPersistence::new());
    store.set_root(Some(tree));
    store.dispatch(|s| commands::toggle_file_selection(s, "root/e.txt", true));
    let original = store.state().selection.clone();

    store.dispatch(|s| commands::toggle_directory_selection(s, "root/d"));
    store.dispatch(|s| commands::toggle_directory_selection(s, "root/d"));
    assert_eq!(store.state().selection, original);

    assert!(store.dispatch(commands::deselect_all_eligible));
    assert!(!store.dispatch(commands::deselect_all_eligible));
    assert!(store.state().selection.selected_paths.is_empty());
}

#[test]
fn test_overlapping_bulk_select_deselects() {
    let tree = FileTree::build(&[
        FileRecord::new("root/a.txt", 1, true),
        FileRecord::new("root/b.txt", 1, true),
    ])
    .unwrap();
    let mut store = SnapshotStore::in_memory();
    store.set_root(Some(tree));

    store.dispatch(|s| commands::bulk_select(s, ["root/a.txt", "root/b.txt"], ["root/a.txt"]));

    let state = store.state();
    assert!(!state.selection.is_selected("root/a.txt"));
    assert!(state.selection.is_selected("root/b.txt"));
}
