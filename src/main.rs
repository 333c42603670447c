mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use context_pack::app::helpers::with_stats;
use context_pack::app::persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
use context_pack::app::store::SnapshotStore;
use context_pack::app::tasks::{apply_completions, ContentLoader};
use context_pack::app::{commands, state::AppState};
use context_pack::config::{self, AppConfig};
use context_pack::core::{DirectoryScanner, FileHandler, FileTree, RecordFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the compiled document can be piped from stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if cli.sizes {
        app_config.show_file_sizes = true;
    }

    let root_dir = std::fs::canonicalize(&cli.root)
        .with_context(|| format!("Cannot open directory {}", cli.root.display()))?;
    let root_name = root_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "root".to_string());

    let mut store = open_store(&cli, &app_config);
    let restored = store
        .state()
        .tree()
        .is_some_and(|tree| tree.root_name() == root_name);
    if cli.restore && !restored {
        tracing::warn!("No saved session for '{}', scanning from scratch", root_name);
    }

    if !restored {
        let records = DirectoryScanner::new(&app_config).scan(&root_dir)?;
        let records = RecordFilter::from_config(&app_config)?.apply(records);
        let tree = FileTree::build(&records)?;
        store.set_root(Some(tree));
    }

    apply_cli_selection(&mut store, &cli, restored)?;

    let extractor = Arc::new(FileHandler::new(&root_dir, app_config.max_file_size_mb));
    let (mut loader, mut events) = ContentLoader::new(extractor);
    let started = loader.spawn_pending_selected(&store);
    let resolved = apply_completions(&mut store, &mut events, started).await;
    loader.shutdown().await?;
    tracing::info!("Resolved {} of {} pending files", resolved, started);

    let state = store.state();
    let document = state.compile(app_config.compile_options()).render();
    tracing::info!(
        "{} files selected, ~{} tokens",
        state.stats.selected_count,
        state.stats.estimated_tokens
    );

    match &cli.output {
        Some(path) => std::fs::write(path, &document)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{document}"),
    }
    Ok(())
}

fn open_store(cli: &cli::Cli, app_config: &AppConfig) -> SnapshotStore {
    let persistence: Box<dyn Persistence> = if cli.no_persist || !app_config.persist_state {
        Box::new(MemoryPersistence::new())
    } else {
        match config::settings::get_state_directory(app_config) {
            Some(dir) => Box::new(JsonFilePersistence::new(dir)),
            None => {
                tracing::warn!("No state directory available; session will not be saved");
                Box::new(MemoryPersistence::new())
            }
        }
    };

    if cli.restore {
        SnapshotStore::restore(persistence)
    } else {
        // A fresh run replaces whatever session was saved before.
        let mut store = SnapshotStore::new(persistence);
        store.reset();
        store
    }
}

/// Applies --select/--deselect. A fresh scan without --select selects every
/// text file; a restored session keeps its selection.
fn apply_cli_selection(store: &mut SnapshotStore, cli: &cli::Cli, restored: bool) -> Result<()> {
    let select = compile_globs(&cli.select)?;
    let deselect = compile_globs(&cli.deselect)?;

    store.dispatch(with_stats(|state: &AppState| {
        let Some(tree) = state.tree() else {
            return state.clone();
        };
        let matching = |set: &GlobSet| -> Vec<String> {
            tree.eligible_files()
                .iter()
                .filter(|path| set.is_match(relative_to_root(path)))
                .cloned()
                .collect()
        };

        let to_select = if cli.select.is_empty() {
            if restored {
                Vec::new()
            } else {
                tree.eligible_files().to_vec()
            }
        } else {
            matching(&select)
        };
        commands::bulk_select(state, to_select, matching(&deselect))
    }));
    Ok(())
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid pattern '{pattern}'"))?);
    }
    Ok(builder.build()?)
}

/// Tree paths start with the root's name; user globs are relative to it.
fn relative_to_root(path: &str) -> &Path {
    Path::new(path.split_once('/').map_or(path, |(_, rest)| rest))
}
