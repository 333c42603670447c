use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::CoreError;

/// Resolves the text of one file, addressed by its tree path.
///
/// Implementations run outside the synchronous mutation path; a failure only
/// affects the file it was asked about.
#[async_trait]
pub trait ContentExtractor: Send + Sync + 'static {
    async fn extract(&self, path: &str) -> Result<String, CoreError>;
}

/// Reads UTF-8 text straight from disk.
///
/// Tree paths start with the root directory's name. That first segment is
/// dropped and the rest is resolved inside the root directory, so a
/// filesystem root (which has no parent) works too.
pub struct FileHandler {
    root_dir: PathBuf,
    max_file_size: u64,
}

impl FileHandler {
    pub fn new(root_dir: &Path, max_file_size_mb: u64) -> Self {
        Self {
            root_dir: root_dir.to_path_buf(),
            max_file_size: max_file_size_mb * 1024 * 1024,
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|s| !s.is_empty())
            .skip(1)
            .fold(self.root_dir.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl ContentExtractor for FileHandler {
    async fn extract(&self, path: &str) -> Result<String, CoreError> {
        let file_path = self.resolve(path);
        let metadata = tokio::fs::metadata(&file_path)
            .await
            .map_err(|e| CoreError::Io(e, file_path.clone()))?;
        if metadata.len() > self.max_file_size {
            return Err(CoreError::content(
                path,
                format!("file too large: {} bytes", metadata.len()),
            ));
        }

        let bytes = tokio::fs::read(&file_path)
            .await
            .map_err(|e| CoreError::Io(e, file_path.clone()))?;
        String::from_utf8(bytes).map_err(|_| CoreError::content(path, "not valid UTF-8"))
    }
}
