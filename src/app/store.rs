//! The single owner of the authoritative snapshot.

use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

use super::commands;
use super::helpers::with_stats;
use super::persistence::{MemoryPersistence, Persistence, Projection};
use super::state::AppState;
use super::tasks::ContentEvent;
use crate::core::FileTree;

/// Identifies one root-selection episode. Content completions tagged with an
/// older generation are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&Arc<AppState>) + Send + Sync>;

/// Holds the current [`AppState`], applies transforms one at a time,
/// notifies subscribers and writes the projection to its [`Persistence`].
///
/// Observers only ever receive complete snapshots: the new state is built
/// aside and swapped in with a single assignment.
pub struct SnapshotStore {
    state: Arc<AppState>,
    generation: Generation,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    persistence: Box<dyn Persistence>,
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("generation", &self.generation)
            .field("stats", &self.state.stats)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl SnapshotStore {
    /// A store with an empty state. Nothing is read from `persistence`.
    pub fn new(persistence: impl Persistence + 'static) -> Self {
        Self {
            state: Arc::new(AppState::default()),
            generation: Generation::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
            persistence: Box::new(persistence),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryPersistence::new())
    }

    /// A store initialized from whatever `persistence` holds.
    ///
    /// An unreadable or corrupt projection is logged and the store starts
    /// empty. Content is only reloaded for restored selected paths.
    pub fn restore(persistence: impl Persistence + 'static) -> Self {
        let mut store = Self::new(persistence);
        match store.persistence.load() {
            Ok(Some(projection)) => {
                let state = rehydrate(projection, store.persistence.as_ref());
                tracing::info!(
                    "Restored session: {} selected, {} expanded",
                    state.selection.selected_paths.len(),
                    state.selection.expanded_paths.len()
                );
                store.state = Arc::new(state);
            }
            Ok(None) => tracing::debug!("No saved session, starting empty"),
            Err(e) => tracing::warn!("Could not restore saved session, starting empty: {}", e),
        }
        store
    }

    /// The current snapshot. Holding it never blocks later dispatches.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Registers a callback that receives every accepted snapshot.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&Arc<AppState>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Applies `transform` to the current snapshot.
    ///
    /// Returns `false` when the transform handed back the very same snapshot;
    /// in that case nobody is notified and nothing is written.
    pub fn dispatch<F>(&mut self, transform: F) -> bool
    where
        F: FnOnce(&AppState) -> AppState,
    {
        let next = transform(&self.state);
        if next.same_as(&self.state) {
            return false;
        }
        self.replace(next);
        true
    }

    /// Loads a new tree (or none) and starts a new generation.
    ///
    /// Content persisted for the previous tree is dropped.
    pub fn set_root(&mut self, tree: Option<FileTree>) -> Generation {
        let stale: Vec<String> = self
            .state
            .tree()
            .map(|t| t.eligible_files().to_vec())
            .unwrap_or_default();
        if let Err(e) = self.persistence.clear_content_for(&stale) {
            tracing::warn!("Failed to clear persisted content: {}", e);
        }

        self.generation = self.generation.next();
        tracing::info!(
            "New root '{}' (generation {})",
            tree.as_ref().map(FileTree::root_name).unwrap_or("<none>"),
            self.generation
        );
        self.replace(commands::set_root(tree));
        self.generation
    }

    /// Drops the tree and wipes everything persisted.
    pub fn reset(&mut self) -> Generation {
        self.generation = self.generation.next();
        let next = commands::reset(&self.state);
        self.replace_without_saving(next);
        if let Err(e) = self.persistence.clear() {
            tracing::warn!("Failed to clear persisted session: {}", e);
        }
        self.generation
    }

    /// Records resolved text for `path` if `generation` is still current.
    pub fn set_file_content(&mut self, generation: Generation, path: &str, text: &str) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding content for '{}' from superseded generation {} (current {})",
                path,
                generation,
                self.generation
            );
            return false;
        }

        let changed = self.dispatch(with_stats(|s| commands::set_file_content(s, path, text)));
        if changed {
            if let Err(e) = self.persistence.save_content(path, text) {
                tracing::warn!("Failed to persist content for '{}': {}", path, e);
            }
        }
        changed
    }

    /// Applies one completion from the content loader. Failures are logged
    /// and leave the file unresolved.
    pub fn apply_content_event(&mut self, event: ContentEvent) -> bool {
        match event.result {
            Ok(text) => self.set_file_content(event.generation, &event.path, &text),
            Err(e) => {
                tracing::warn!("Content resolution failed for '{}': {}", event.path, e);
                false
            }
        }
    }

    /// Swaps in `next` and writes the projection if the tree, selection or
    /// expansion changed. Content-only changes skip the write: contents are
    /// stored per path and stats are recomputed on restore.
    fn replace(&mut self, next: AppState) {
        let projection_changed = !projection_shared(&self.state, &next);
        self.replace_without_saving(next);
        if !projection_changed {
            return;
        }
        let projection = Projection::from_state(&self.state);
        if let Err(e) = self.persistence.save(&projection) {
            tracing::warn!("Failed to persist session: {}", e);
        }
    }

    fn replace_without_saving(&mut self, next: AppState) {
        self.state = Arc::new(next);
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.state);
        }
    }
}

/// `true` when both snapshots share the tree and selection storage, so their
/// projections differ at most in stats.
fn projection_shared(previous: &AppState, next: &AppState) -> bool {
    let same_root = match (&previous.root, &next.root) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    };
    same_root && previous.selection.shares_storage_with(&next.selection)
}

/// Turns a loaded projection back into a snapshot, dropping paths that do
/// not resolve in the restored tree.
fn rehydrate(projection: Projection, persistence: &dyn Persistence) -> AppState {
    let tree = projection.root.map(FileTree::from_root);
    let mut state = commands::set_root(tree);
    let Some(tree) = state.root.clone() else {
        return state;
    };

    let selected: IndexSet<String> = projection
        .selected_paths
        .into_iter()
        .filter(|p| tree.is_eligible_file(p))
        .collect();
    let expanded: IndexSet<String> = projection
        .expanded_paths
        .into_iter()
        .filter(|p| tree.is_directory(p))
        .collect();

    for path in &selected {
        match persistence.load_content(path) {
            Ok(Some(text)) => {
                state.contents_mut().insert(path.clone(), text.into());
            }
            Ok(None) => tracing::debug!("No saved content for '{}'", path),
            Err(e) => tracing::warn!("Could not reload content for '{}': {}", path, e),
        }
    }

    *state.selection.selected_mut() = selected;
    *state.selection.expanded_mut() = expanded;
    commands::recompute_stats(&state)
}
