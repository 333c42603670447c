pub mod error;
pub mod file_handler;
pub mod ignore;
pub mod node;
pub mod output;
pub mod scanner;
pub mod selection;
pub mod tree_builder;
pub mod tree_generator;

use std::collections::HashMap;
use std::sync::Arc;

/// Extracted text per file path. A file with no entry is still pending.
pub type FileContents = HashMap<String, Arc<str>>;

pub use error::CoreError;
pub use file_handler::{ContentExtractor, FileHandler};
pub use ignore::{build_globset_from_patterns, RecordFilter};
pub use node::Node;
pub use output::{compile, CompileOptions, CompiledOutput, Document};
pub use scanner::DirectoryScanner;
pub use selection::{compute_check_state, CheckState, SelectionState};
pub use tree_builder::{FileRecord, FileTree, TreeBuilder};
pub use tree_generator::TreeGenerator;
