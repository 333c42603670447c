//! Generates an ASCII representation of the selected part of a directory tree.

use super::node::Node;

/// A utility struct for generating an ASCII directory tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

/// A borrowed view of the nodes that survive pruning, children already sorted.
struct PrunedNode<'a> {
    node: &'a Node,
    children: Vec<PrunedNode<'a>>,
}

impl TreeGenerator {
    /// Renders every file accepted by `include` together with its ancestors.
    ///
    /// Directories without an included file anywhere beneath them are left
    /// out, the root included: nothing is rendered when nothing is included.
    pub fn generate_tree<F>(root: &Node, include: F, show_sizes: bool) -> String
    where
        F: Fn(&Node) -> bool,
    {
        let mut result = String::new();
        let Some(pruned) = Self::prune(root, &include) else {
            return result;
        };

        result.push_str("└── ");
        result.push_str(&Self::label(pruned.node, show_sizes));
        result.push('\n');
        Self::render_children(&pruned.children, &mut result, "    ", show_sizes);

        result
    }

    fn prune<'a, F>(node: &'a Node, include: &F) -> Option<PrunedNode<'a>>
    where
        F: Fn(&Node) -> bool,
    {
        match node {
            Node::File { .. } => include(node).then_some(PrunedNode {
                node,
                children: Vec::new(),
            }),
            Node::Directory { .. } => {
                let children: Vec<PrunedNode<'a>> = node
                    .sorted_children()
                    .into_iter()
                    .filter_map(|child| Self::prune(child, include))
                    .collect();
                (!children.is_empty()).then_some(PrunedNode { node, children })
            }
        }
    }

    /// Renders the children of a tree node.
    fn render_children(
        children: &[PrunedNode<'_>],
        result: &mut String,
        prefix: &str,
        show_sizes: bool,
    ) {
        for (i, child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            result.push_str(&format!(
                "{prefix}{connector}{}\n",
                Self::label(child.node, show_sizes)
            ));

            if !child.children.is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_children(&child.children, result, &new_prefix, show_sizes);
            }
        }
    }

    fn label(node: &Node, show_sizes: bool) -> String {
        match node {
            Node::File { name, size, .. } if show_sizes => {
                format!("{name} ({})", format_size(*size))
            }
            _ => node.name().to_string(),
        }
    }
}

/// Formats a byte count as `B`, `KB`, `MB` or `GB` with one decimal above bytes.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree_builder::{FileRecord, TreeBuilder};

    fn sample_root() -> Node {
        TreeBuilder::build(&[
            FileRecord::new("proj/src/main.rs", 2048, true),
            FileRecord::new("proj/src/util/mod.rs", 10, true),
            FileRecord::new("proj/README.md", 5, true),
            FileRecord::new("proj/docs/guide.md", 7, true),
            FileRecord::new("proj/assets/logo.png", 900, false),
        ])
        .unwrap()
    }

    #[test]
    fn test_generate_tree_draws_connectors_in_display_order() {
        let root = sample_root();
        let tree = TreeGenerator::generate_tree(&root, |n| n.is_eligible(), false);

        insta::assert_snapshot!(tree, @r"
        └── proj
            ├── docs
            │   └── guide.md
            ├── src
            │   ├── util
            │   │   └── mod.rs
            │   └── main.rs
            └── README.md
        ");
    }

    #[test]
    fn test_generate_tree_prunes_unselected_subtrees() {
        let root = sample_root();
        let tree = TreeGenerator::generate_tree(&root, |n| n.path() == "proj/src/main.rs", true);

        assert_eq!(tree, "└── proj\n    └── src\n        └── main.rs (2.0 KB)\n");
        assert!(!tree.contains("docs"));
        assert!(!tree.contains("assets"));
    }

    #[test]
    fn test_generate_tree_omits_root_when_nothing_included() {
        let root = sample_root();
        assert_eq!(TreeGenerator::generate_tree(&root, |_| false, false), "");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
