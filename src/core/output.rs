//! Compiles the selected files into the document that gets pasted into a prompt.
//!
//! The rendered text is the tool's one external format:
//!
//! ```text
//! <folder-structure>
//! └── root
//!     └── file.txt
//! </folder-structure>
//!
//! <document path="root/file.txt">
//! ...
//! </document>
//! ```

use indexmap::IndexSet;
use std::sync::Arc;

use super::tree_builder::FileTree;
use super::tree_generator::TreeGenerator;
use super::FileContents;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Append ` (<size>)` to file entries in the ASCII tree.
    pub show_file_sizes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub content: Arc<str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledOutput {
    pub ascii_tree: String,
    pub documents: Vec<Document>,
}

/// Compiles the selection against `tree`.
///
/// Only eligible, selected files whose content has resolved take part:
/// pending files are left out of both the tree and the documents, and
/// selection entries that no longer resolve in `tree` are ignored.
pub fn compile(
    tree: Option<&FileTree>,
    selected: &IndexSet<String>,
    contents: &FileContents,
    options: CompileOptions,
) -> CompiledOutput {
    let Some(tree) = tree else {
        return CompiledOutput::default();
    };

    let is_included = |path: &str| {
        selected.contains(path) && tree.is_eligible_file(path) && contents.contains_key(path)
    };

    let ascii_tree = TreeGenerator::generate_tree(
        tree.root(),
        |node| is_included(node.path()),
        options.show_file_sizes,
    );

    let documents = selected
        .iter()
        .filter(|path| is_included(path.as_str()))
        .filter_map(|path| {
            contents.get(path).map(|content| Document {
                path: path.clone(),
                content: content.clone(),
            })
        })
        .collect();

    CompiledOutput {
        ascii_tree,
        documents,
    }
}

impl CompiledOutput {
    /// Renders the blocks, separated by exactly one blank line.
    pub fn render(&self) -> String {
        let mut blocks = Vec::with_capacity(self.documents.len() + 1);
        blocks.push(format!(
            "<folder-structure>\n{}</folder-structure>",
            self.ascii_tree
        ));

        for document in &self.documents {
            let mut block = format!("<document path=\"{}\">\n", escape_attribute(&document.path));
            block.push_str(&document.content);
            if !document.content.ends_with('\n') {
                block.push('\n');
            }
            block.push_str("</document>");
            blocks.push(block);
        }

        let mut rendered = blocks.join("\n\n");
        rendered.push('\n');
        rendered
    }
}

/// The rough token estimate used throughout: one token per four characters.
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
