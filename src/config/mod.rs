pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::output::CompileOptions;

/// How dotfiles and dot-directories are treated when a directory is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFilePolicy {
    /// Keep them; the view flags them so they can be de-emphasized.
    #[default]
    Include,
    /// Drop them before the tree is built.
    Exclude,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub hidden_files: HiddenFilePolicy,
    pub exclude_patterns: BTreeSet<String>,
    pub show_file_sizes: bool,
    pub persist_state: bool,
    pub state_directory: Option<PathBuf>,
    pub max_file_size_mb: u64,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        settings::load_config(path)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            show_file_sizes: self.show_file_sizes,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let exclude_patterns = [
            "node_modules/",
            "target/",
            "venv/",
            "__pycache__/",
            ".DS_Store",
            "Thumbs.db",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            hidden_files: HiddenFilePolicy::Include,
            exclude_patterns,
            show_file_sizes: false,
            persist_state: true,
            state_directory: None,
            max_file_size_mb: 20,
        }
    }
}
