//! The restorable projection of a snapshot and the stores that hold it.
//!
//! The projection (tree, selection, expansion, stats) is saved as a whole.
//! File contents are stored separately, one entry per path, so a restart only
//! reads back the content of files that are still selected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::state::{AppState, Stats};
use crate::core::{CoreError, Node};

const PROJECTION_VERSION: u32 = 1;
const STATE_FILE: &str = "state.json";
const CONTENT_DIR: &str = "contents";

/// The serializable subset of an [`AppState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    #[serde(default)]
    pub version: u32,
    pub root: Option<Node>,
    pub selected_paths: Vec<String>,
    pub expanded_paths: Vec<String>,
    #[serde(default)]
    pub stats: Stats,
}

impl Projection {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            version: PROJECTION_VERSION,
            root: state.tree().map(|t| t.root().clone()),
            selected_paths: state.selection.selected_paths.iter().cloned().collect(),
            expanded_paths: state.selection.expanded_paths.iter().cloned().collect(),
            stats: state.stats,
        }
    }
}

/// Durable storage used by the snapshot store.
pub trait Persistence: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Projection>, CoreError>;
    fn save(&self, projection: &Projection) -> Result<(), CoreError>;
    fn load_content(&self, path: &str) -> Result<Option<String>, CoreError>;
    fn save_content(&self, path: &str, content: &str) -> Result<(), CoreError>;
    fn clear_content_for(&self, paths: &[String]) -> Result<(), CoreError>;
    /// Removes the projection and every stored content entry.
    fn clear(&self) -> Result<(), CoreError>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn load(&self) -> Result<Option<Projection>, CoreError> {
        (**self).load()
    }

    fn save(&self, projection: &Projection) -> Result<(), CoreError> {
        (**self).save(projection)
    }

    fn load_content(&self, path: &str) -> Result<Option<String>, CoreError> {
        (**self).load_content(path)
    }

    fn save_content(&self, path: &str, content: &str) -> Result<(), CoreError> {
        (**self).save_content(path, content)
    }

    fn clear_content_for(&self, paths: &[String]) -> Result<(), CoreError> {
        (**self).clear_content_for(paths)
    }

    fn clear(&self) -> Result<(), CoreError> {
        (**self).clear()
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    projection: Option<String>,
    contents: HashMap<String, String>,
}

/// In-memory persistence. Clones share the same storage, so a test can keep
/// a handle while a store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Persistence("memory store lock poisoned".to_string()))
    }

    /// Stores raw projection text, e.g. to simulate corruption.
    pub fn set_raw_projection(&self, raw: impl Into<String>) -> Result<(), CoreError> {
        self.lock()?.projection = Some(raw.into());
        Ok(())
    }

    pub fn stored_content_paths(&self) -> Vec<String> {
        self.lock()
            .map(|inner| {
                let mut paths: Vec<String> = inner.contents.keys().cloned().collect();
                paths.sort();
                paths
            })
            .unwrap_or_default()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Projection>, CoreError> {
        match &self.lock()?.projection {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, projection: &Projection) -> Result<(), CoreError> {
        let raw = serde_json::to_string(projection)?;
        self.lock()?.projection = Some(raw);
        Ok(())
    }

    fn load_content(&self, path: &str) -> Result<Option<String>, CoreError> {
        Ok(self.lock()?.contents.get(path).cloned())
    }

    fn save_content(&self, path: &str, content: &str) -> Result<(), CoreError> {
        self.lock()?
            .contents
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn clear_content_for(&self, paths: &[String]) -> Result<(), CoreError> {
        let mut inner = self.lock()?;
        for path in paths {
            inner.contents.remove(path);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        let mut inner = self.lock()?;
        inner.projection = None;
        inner.contents.clear();
        Ok(())
    }
}

/// Persistence in a directory: `state.json` plus `contents/<sha256>.txt`.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    dir: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn content_path(&self, path: &str) -> PathBuf {
        let digest = Sha256::digest(path.as_bytes());
        self.dir.join(CONTENT_DIR).join(format!("{digest:x}.txt"))
    }

    /// Writes to a sibling temp file first so a crash never leaves half a file.
    fn write_atomic(target: &Path, data: &[u8]) -> Result<(), CoreError> {
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| CoreError::Io(e, parent.to_path_buf()))?;
        let tmp = target.with_extension("tmp");
        fs::write(&tmp, data).map_err(|e| CoreError::Io(e, tmp.clone()))?;
        fs::rename(&tmp, target).map_err(|e| CoreError::Io(e, target.to_path_buf()))
    }

    fn read_optional(path: &Path) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Io(e, path.to_path_buf())),
        }
    }

    fn remove_optional(path: &Path) -> Result<(), CoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Io(e, path.to_path_buf())),
        }
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> Result<Option<Projection>, CoreError> {
        let Some(raw) = Self::read_optional(&self.state_path())? else {
            return Ok(None);
        };
        let projection: Projection = serde_json::from_str(&raw)?;
        if projection.version > PROJECTION_VERSION {
            return Err(CoreError::Persistence(format!(
                "unsupported projection version {}",
                projection.version
            )));
        }
        Ok(Some(projection))
    }

    fn save(&self, projection: &Projection) -> Result<(), CoreError> {
        let raw = serde_json::to_vec(projection)?;
        Self::write_atomic(&self.state_path(), &raw)
    }

    fn load_content(&self, path: &str) -> Result<Option<String>, CoreError> {
        Self::read_optional(&self.content_path(path))
    }

    fn save_content(&self, path: &str, content: &str) -> Result<(), CoreError> {
        Self::write_atomic(&self.content_path(path), content.as_bytes())
    }

    fn clear_content_for(&self, paths: &[String]) -> Result<(), CoreError> {
        for path in paths {
            Self::remove_optional(&self.content_path(path))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        Self::remove_optional(&self.state_path())?;
        let content_dir = self.dir.join(CONTENT_DIR);
        match fs::remove_dir_all(&content_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Io(e, content_dir)),
        }
    }
}
