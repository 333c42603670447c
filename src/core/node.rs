//! The tagged tree node shared by the builder, the selection logic and the compiler.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single entry in the materialized directory tree.
///
/// `path` is the slash-joined path from the chosen root (the root's own name
/// is the first segment) and is unique across a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Directory {
        name: String,
        path: String,
        /// Insertion order. Use [`Node::sorted_children`] for display order.
        children: Vec<Node>,
    },
    File {
        name: String,
        path: String,
        size: u64,
        is_text_file: bool,
    },
}

impl Node {
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Node::Directory {
            name: name.into(),
            path: path.into(),
            children: Vec::new(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        path: impl Into<String>,
        size: u64,
        is_text_file: bool,
    ) -> Self {
        Node::File {
            name: name.into(),
            path: path.into(),
            size,
            is_text_file,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Directory { name, .. } | Node::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::Directory { path, .. } | Node::File { path, .. } => path,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    /// `true` for a text file, the only kind of node that can be selected.
    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            Node::File {
                is_text_file: true,
                ..
            }
        )
    }

    /// Dotfiles and dot-directories.
    pub fn is_hidden(&self) -> bool {
        self.name().starts_with('.')
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Directory { children, .. } => children,
            Node::File { .. } => &[],
        }
    }

    /// Children in display order: directories first, then byte-wise by name.
    pub fn sorted_children(&self) -> Vec<&Node> {
        let mut children: Vec<&Node> = self.children().iter().collect();
        children.sort_by(|a, b| display_order(a, b));
        children
    }
}

/// The comparator used everywhere nodes are shown or compiled.
pub fn display_order(a: &Node, b: &Node) -> Ordering {
    match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name().cmp(b.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order_puts_directories_first_then_bytewise_names() {
        let mut root = Node::directory("root", "root");
        if let Node::Directory { children, .. } = &mut root {
            children.push(Node::file("b.txt", "root/b.txt", 1, true));
            children.push(Node::file("B.txt", "root/B.txt", 1, true));
            children.push(Node::directory("zeta", "root/zeta"));
            children.push(Node::file("a.txt", "root/a.txt", 1, true));
            children.push(Node::directory("Alpha", "root/Alpha"));
        }

        let names: Vec<&str> = root.sorted_children().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["Alpha", "zeta", "B.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_only_text_files_are_eligible() {
        assert!(Node::file("a.rs", "r/a.rs", 3, true).is_eligible());
        assert!(!Node::file("a.png", "r/a.png", 3, false).is_eligible());
        assert!(!Node::directory("src", "r/src").is_eligible());
    }

    #[test]
    fn test_node_serializes_with_kind_tag() {
        let node = Node::file("a.rs", "r/a.rs", 3, true);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["is_text_file"], true);

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
