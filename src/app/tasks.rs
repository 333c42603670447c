//! Asynchronous content resolution, kept outside the synchronous mutation path.
//!
//! Every file gets its own task. A task never touches the store: it sends
//! exactly one [`ContentEvent`] tagged with the generation it was started
//! for, and the single consumer of the channel applies it.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::store::{Generation, SnapshotStore};
use crate::core::{ContentExtractor, CoreError};

/// The outcome of resolving one file.
#[derive(Debug)]
pub struct ContentEvent {
    pub generation: Generation,
    pub path: String,
    pub result: Result<String, CoreError>,
}

/// Spawns extraction tasks and hands out their completions.
pub struct ContentLoader {
    extractor: Arc<dyn ContentExtractor>,
    sender: mpsc::UnboundedSender<ContentEvent>,
    handles: Vec<JoinHandle<()>>,
}

impl ContentLoader {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
    ) -> (Self, mpsc::UnboundedReceiver<ContentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let loader = Self {
            extractor,
            sender,
            handles: Vec::new(),
        };
        (loader, receiver)
    }

    /// Starts one task per path. Returns how many were started.
    pub fn spawn_all<I>(&mut self, generation: Generation, paths: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        self.handles.retain(|h| !h.is_finished());
        let mut started = 0;
        for path in paths {
            let extractor = Arc::clone(&self.extractor);
            let sender = self.sender.clone();
            self.handles.push(tokio::spawn(async move {
                let result = resolve_isolated(extractor, &path).await;
                let event = ContentEvent {
                    generation,
                    path,
                    result,
                };
                if sender.send(event).is_err() {
                    tracing::debug!("Content receiver dropped; discarding completion");
                }
            }));
            started += 1;
        }
        tracing::debug!("Spawned {} content tasks for generation {}", started, generation);
        started
    }

    /// Starts tasks for the selected files of the current snapshot that
    /// have no content yet.
    pub fn spawn_pending_selected(&mut self, store: &SnapshotStore) -> usize {
        let state = store.state();
        let pending: Vec<String> = state
            .pending_paths()
            .into_iter()
            .filter(|p| state.selection.is_selected(p))
            .collect();
        self.spawn_all(store.generation(), pending)
    }

    pub fn in_flight(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Aborts every task that has not finished yet.
    pub fn cancel_all(&mut self) {
        let cancelled = self.in_flight();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        if cancelled > 0 {
            tracing::info!("Cancelled {} in-flight content tasks", cancelled);
        }
    }

    /// Waits for every task. Aborted tasks are not an error; a panicked one is.
    pub async fn shutdown(mut self) -> Result<(), CoreError> {
        for handle in self.handles.drain(..) {
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(CoreError::from(e)),
            }
        }
        Ok(())
    }
}

/// Aborts the wrapped task when dropped, so cancelling the outer task also
/// stops the extraction it is waiting on.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one extraction in its own task so a panic becomes a failed
/// resolution instead of a missing completion.
async fn resolve_isolated(
    extractor: Arc<dyn ContentExtractor>,
    path: &str,
) -> Result<String, CoreError> {
    let owned = path.to_string();
    let mut inner = AbortOnDrop(tokio::spawn(async move {
        extractor.extract(&owned).await
    }));
    match (&mut inner.0).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(CoreError::content(path, "extractor panicked")),
        Err(e) => Err(CoreError::content(path, e)),
    }
}

/// Applies up to `expected` completions to the store, stopping early if the
/// channel closes. Returns how many changed the snapshot.
pub async fn apply_completions(
    store: &mut SnapshotStore,
    events: &mut mpsc::UnboundedReceiver<ContentEvent>,
    expected: usize,
) -> usize {
    let mut applied = 0;
    for _ in 0..expected {
        let Some(event) = events.recv().await else {
            break;
        };
        if store.apply_content_event(event) {
            applied += 1;
        }
    }
    applied
}
