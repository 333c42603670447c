//! Materializes a flat list of file records into a rooted, indexed tree.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use super::error::CoreError;
use super::node::Node;
use super::selection::CheckState;

/// One file as supplied by the acquisition collaborator.
///
/// `relative_path` starts with the name of the chosen root directory,
/// e.g. `project/src/main.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub relative_path: String,
    pub size: u64,
    pub is_text_file: bool,
}

impl FileRecord {
    pub fn new(relative_path: impl Into<String>, size: u64, is_text_file: bool) -> Self {
        Self {
            relative_path: relative_path.into(),
            size,
            is_text_file,
        }
    }
}

/// A stateless builder turning `FileRecord`s into a `Node` tree.
pub struct TreeBuilder;

/// A directory under construction. Children reference either another
/// pending directory (by arena index) or a finished file node.
struct PendingDir {
    name: String,
    path: String,
    children: Vec<PendingChild>,
}

enum PendingChild {
    Dir(usize),
    File(Node),
}

impl TreeBuilder {
    /// Builds the tree rooted at the first segment of the first record.
    ///
    /// Records outside that root, records without a file segment, and records
    /// colliding with an existing path are skipped with a warning.
    pub fn build(records: &[FileRecord]) -> Result<Node, CoreError> {
        let first = records.first().ok_or(CoreError::EmptyInput)?;
        let root_name = first
            .relative_path
            .split('/')
            .find(|s| !s.is_empty())
            .ok_or(CoreError::EmptyInput)?
            .to_string();

        let mut arena = vec![PendingDir {
            name: root_name.clone(),
            path: root_name.clone(),
            children: Vec::new(),
        }];
        let mut dirs: HashMap<String, usize> = HashMap::from([(root_name.clone(), 0)]);
        let mut files: HashSet<String> = HashSet::new();

        'records: for record in records {
            let segments: Vec<&str> = record
                .relative_path
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();

            let Some((file_name, parents)) = segments.split_last() else {
                continue;
            };
            if parents.is_empty() {
                tracing::warn!("Skipping record without a file segment: {}", record.relative_path);
                continue;
            }
            if parents[0] != root_name {
                tracing::warn!(
                    "Skipping record outside root '{}': {}",
                    root_name,
                    record.relative_path
                );
                continue;
            }

            let mut parent = 0;
            let mut current_path = root_name.clone();
            for segment in &parents[1..] {
                current_path.push('/');
                current_path.push_str(segment);

                if files.contains(&current_path) {
                    tracing::warn!(
                        "Skipping {}: '{}' is already a file",
                        record.relative_path,
                        current_path
                    );
                    continue 'records;
                }

                parent = match dirs.get(&current_path) {
                    Some(&idx) => idx,
                    None => {
                        let idx = arena.len();
                        arena.push(PendingDir {
                            name: segment.to_string(),
                            path: current_path.clone(),
                            children: Vec::new(),
                        });
                        arena[parent].children.push(PendingChild::Dir(idx));
                        dirs.insert(current_path.clone(), idx);
                        idx
                    }
                };
            }

            let file_path = format!("{current_path}/{file_name}");
            if dirs.contains_key(&file_path) || !files.insert(file_path.clone()) {
                tracing::warn!("Skipping duplicate path: {}", file_path);
                continue;
            }
            arena[parent].children.push(PendingChild::File(Node::file(
                *file_name,
                file_path,
                record.size,
                record.is_text_file,
            )));
        }

        tracing::debug!(
            "Built tree '{}' with {} directories and {} files",
            root_name,
            dirs.len(),
            files.len()
        );
        Ok(Self::materialize(&mut arena, 0))
    }

    fn materialize(arena: &mut [PendingDir], idx: usize) -> Node {
        let pending = std::mem::take(&mut arena[idx].children);
        let children = pending
            .into_iter()
            .map(|child| match child {
                PendingChild::Dir(child_idx) => Self::materialize(arena, child_idx),
                PendingChild::File(node) => node,
            })
            .collect();

        Node::Directory {
            name: std::mem::take(&mut arena[idx].name),
            path: std::mem::take(&mut arena[idx].path),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    /// Range into `FileTree::eligible` covering every eligible descendant.
    Directory { eligible: Range<usize> },
    File { is_text_file: bool },
}

/// A tree plus a `path -> entry` index, built once per root.
///
/// Eligible files are laid out in display order, so every directory owns a
/// contiguous slice of them.
#[derive(Debug, Clone)]
pub struct FileTree {
    root: Node,
    index: HashMap<String, Entry>,
    eligible: Vec<String>,
    directories: Vec<String>,
}

impl FileTree {
    pub fn build(records: &[FileRecord]) -> Result<Self, CoreError> {
        TreeBuilder::build(records).map(Self::from_root)
    }

    /// Indexes an existing root, e.g. one restored from a projection.
    pub fn from_root(root: Node) -> Self {
        let mut index = HashMap::new();
        let mut eligible = Vec::new();
        let mut directories = Vec::new();
        Self::index_node(&root, &mut index, &mut eligible, &mut directories);
        Self {
            root,
            index,
            eligible,
            directories,
        }
    }

    fn index_node(
        node: &Node,
        index: &mut HashMap<String, Entry>,
        eligible: &mut Vec<String>,
        directories: &mut Vec<String>,
    ) {
        match node {
            Node::File {
                path, is_text_file, ..
            } => {
                if *is_text_file {
                    eligible.push(path.clone());
                }
                index.insert(
                    path.clone(),
                    Entry::File {
                        is_text_file: *is_text_file,
                    },
                );
            }
            Node::Directory { path, .. } => {
                directories.push(path.clone());
                let start = eligible.len();
                for child in node.sorted_children() {
                    Self::index_node(child, index, eligible, directories);
                }
                index.insert(
                    path.clone(),
                    Entry::Directory {
                        eligible: start..eligible.len(),
                    },
                );
            }
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_name(&self) -> &str {
        self.root.name()
    }

    /// Number of nodes, directories included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn is_directory(&self, path: &str) -> bool {
        matches!(self.index.get(path), Some(Entry::Directory { .. }))
    }

    pub fn is_eligible_file(&self, path: &str) -> bool {
        matches!(
            self.index.get(path),
            Some(Entry::File { is_text_file: true })
        )
    }

    /// Every eligible file, in display order.
    pub fn eligible_files(&self) -> &[String] {
        &self.eligible
    }

    /// Eligible descendants of a directory, or `None` if `path` is not one.
    pub fn eligible_files_under(&self, path: &str) -> Option<&[String]> {
        match self.index.get(path) {
            Some(Entry::Directory { eligible }) => Some(&self.eligible[eligible.clone()]),
            _ => None,
        }
    }

    /// Every directory path, root first, in display order.
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    /// The derived tri-state of the node at `path`, via the index.
    pub fn check_state(&self, path: &str, selected: &IndexSet<String>) -> Option<CheckState> {
        match self.index.get(path)? {
            Entry::File { is_text_file } => Some(CheckState::for_file(
                *is_text_file && selected.contains(path),
            )),
            Entry::Directory { eligible } => {
                let files = &self.eligible[eligible.clone()];
                let count = files.iter().filter(|p| selected.contains(*p)).count();
                Some(CheckState::from_counts(files.len(), count))
            }
        }
    }

    /// Walks from the root to the node at `path`.
    pub fn find(&self, path: &str) -> Option<&Node> {
        if !self.contains(path) {
            return None;
        }
        let mut current = &self.root;
        let mut current_path = current.path().to_string();
        let rest = path.strip_prefix(current_path.as_str())?;
        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            current_path.push('/');
            current_path.push_str(segment);
            current = current
                .children()
                .iter()
                .find(|child| child.path() == current_path)?;
        }
        Some(current)
    }
}
