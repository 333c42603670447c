use clap::Parser;
use std::path::PathBuf;

/// context-pack: compile selected files of a directory into one LLM-ready document
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to pack (defaults to CWD)
    #[arg(value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Glob of files to select, relative to DIR (e.g. "src/**/*.rs").
    /// Can be given multiple times. Without it every text file is selected.
    #[arg(long, value_name = "PATTERN")]
    pub select: Vec<String>,

    /// Glob of files to leave out. Wins over --select.
    #[arg(long, value_name = "PATTERN")]
    pub deselect: Vec<String>,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Append file sizes to the folder structure
    #[arg(long)]
    pub sizes: bool,

    /// Continue the saved session for DIR instead of starting fresh
    #[arg(long)]
    pub restore: bool,

    /// Do not read or write the saved session
    #[arg(long, conflicts_with = "restore")]
    pub no_persist: bool,

    /// Use this config file instead of the platform default
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
