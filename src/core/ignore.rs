//! Pattern matching for excluding records and for glob-based selection.

use globset::{Glob, GlobSet, GlobSetBuilder};

use super::error::CoreError;
use super::tree_builder::FileRecord;
use crate::config::{AppConfig, HiddenFilePolicy};

/// Builds a `GlobSet` from a set of `.gitignore`-style patterns.
///
/// Patterns match anywhere in a relative path; a trailing `/` matches a
/// directory and everything below it. Comments and blank lines are skipped.
pub fn build_globset_from_patterns<'a, I>(patterns: I) -> Result<GlobSet, CoreError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let trimmed_pattern = pattern.trim();
        if trimmed_pattern.is_empty() || trimmed_pattern.starts_with('#') {
            continue;
        }

        if let Some(dir_pattern) = trimmed_pattern.strip_suffix('/') {
            builder.add(Glob::new(&format!("**/{dir_pattern}"))?);
            builder.add(Glob::new(&format!("**/{dir_pattern}/**"))?);
        } else {
            builder.add(Glob::new(&format!("**/{trimmed_pattern}"))?);
        }
    }

    Ok(builder.build()?)
}

/// Drops records before the tree is built, per the configured policy.
pub struct RecordFilter {
    exclude: GlobSet,
    hidden_files: HiddenFilePolicy,
}

impl RecordFilter {
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self {
            exclude: build_globset_from_patterns(&config.exclude_patterns)?,
            hidden_files: config.hidden_files,
        })
    }

    /// `true` if any segment below the root starts with a dot.
    pub fn is_hidden_path(relative_path: &str) -> bool {
        relative_path
            .split('/')
            .skip(1)
            .any(|segment| segment.starts_with('.'))
    }

    pub fn keeps(&self, record: &FileRecord) -> bool {
        if self.hidden_files == HiddenFilePolicy::Exclude
            && Self::is_hidden_path(&record.relative_path)
        {
            return false;
        }
        !self.exclude.is_match(&record.relative_path)
    }

    pub fn apply(&self, records: Vec<FileRecord>) -> Vec<FileRecord> {
        let before = records.len();
        let kept: Vec<FileRecord> = records.into_iter().filter(|r| self.keeps(r)).collect();
        tracing::debug!("Record filter kept {} of {} records", kept.len(), before);
        kept
    }
}
