use anyhow::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "adoc", "org", "tex",
    "rs", "py", "js", "ts", "jsx", "tsx", "mjs", "cjs", "java", "kt", "kts", "scala",
    "c", "cpp", "cxx", "cc", "h", "hpp", "hxx", "go", "rb", "php", "swift", "dart",
    "cs", "fs", "hs", "ml", "ex", "exs", "erl", "clj", "lua", "pl", "r", "jl", "zig", "nim",
    "html", "htm", "xml", "css", "scss", "sass", "less", "svg", "vue", "svelte",
    "json", "jsonl", "yaml", "yml", "toml", "ini", "cfg", "conf", "properties", "env",
    "sql", "graphql", "gql", "proto", "prisma",
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd",
    "csv", "tsv", "log", "diff", "patch", "lock",
    "gitignore", "gitattributes", "editorconfig", "dockerignore",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "tiff", "tif", "heic", "avif",
    "exe", "dll", "so", "dylib", "deb", "rpm", "msi", "app",
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar", "war", "whl",
    "mp3", "mp4", "avi", "mkv", "mov", "wav", "flac", "webm",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    "bin", "dat", "db", "sqlite", "sqlite3", "o", "obj", "a", "lib", "rlib", "class", "pyc",
    "woff", "woff2", "ttf", "otf", "wasm",
];

/// Files below this size are sniffed when the extension is unknown.
const SNIFF_LIMIT: u64 = 20 * 1024 * 1024;

/// Classifies by extension alone; `None` when the extension is unknown.
pub fn classify_by_extension(path: &Path) -> Option<bool> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        Some(true)
    } else if BINARY_EXTENSIONS.contains(&extension.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Determines if a file is likely to be a text file
pub fn is_text_file(path: &Path) -> Result<bool> {
    if let Some(is_text) = classify_by_extension(path) {
        return Ok(is_text);
    }

    if std::fs::metadata(path)?.len() > SNIFF_LIMIT {
        return Ok(false);
    }

    check_file_content(path)
}

/// Checks the first KiB: no NUL bytes and valid UTF-8 means text.
fn check_file_content(path: &Path) -> Result<bool> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0; 1024];
    let bytes_read = reader.read(&mut buffer)?;

    if bytes_read == 0 {
        return Ok(true);
    }
    let sample = &buffer[..bytes_read];
    if sample.contains(&0) {
        tracing::debug!("Binary (null bytes) detected in {}", path.display());
        return Ok(false);
    }

    Ok(match std::str::from_utf8(sample) {
        Ok(_) => true,
        // A multi-byte character cut off by the buffer boundary is still text.
        Err(e) => e.error_len().is_none() && bytes_read == buffer.len(),
    })
}
