//! Turns a directory on disk into the flat record list the tree builder consumes.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::tree_builder::FileRecord;
use crate::config::{AppConfig, HiddenFilePolicy};
use crate::utils::file_detection::is_text_file;

pub struct DirectoryScanner {
    skip_hidden: bool,
}

impl DirectoryScanner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            skip_hidden: config.hidden_files == HiddenFilePolicy::Exclude,
        }
    }

    /// Walks `root` (honouring `.gitignore`) and classifies every file.
    ///
    /// Entries that cannot be read are skipped with a warning; only an
    /// unusable root is an error.
    pub fn scan(&self, root: &Path) -> Result<Vec<FileRecord>, CoreError> {
        let root = std::fs::canonicalize(root).map_err(|e| CoreError::Io(e, root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(CoreError::Io(
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
                root,
            ));
        }
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string());

        let files: Vec<PathBuf> = WalkBuilder::new(&root)
            .hidden(self.skip_hidden)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .collect();

        tracing::info!("Collected {} files under {}", files.len(), root.display());

        let mut records: Vec<FileRecord> = files
            .par_iter()
            .filter_map(|path| {
                let relative = path.strip_prefix(&root).ok()?;
                let segments: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                let is_text = is_text_file(path).unwrap_or_else(|e| {
                    tracing::warn!("Could not classify {}: {}", path.display(), e);
                    false
                });
                Some(FileRecord::new(
                    format!("{root_name}/{}", segments.join("/")),
                    size,
                    is_text,
                ))
            })
            .collect();

        records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(records)
    }
}
