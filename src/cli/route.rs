//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::catalog::{CatalogPath, FsScanner, SnapshotRepository};
use crate::cli::help::command_name;
use crate::cli::parse::{Commands, DirtabCommands, OutputFormat};
use crate::cli::presentation::{
    format_check_json, format_check_text, format_diff_json, format_diff_text, format_match_text,
    format_reload_text, DiffReport,
};
use crate::config::{ConfigLoader, SnapcatConfig};
use crate::diff::TreeDiffer;
use crate::dirtab::Dirtab;
use crate::error::ApiError;
use crate::types::hash_to_hex;
use crate::watch::{FileEvent, FileWatcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SnapcatConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: SnapcatConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &SnapcatConfig {
        &self.config
    }

    /// Run one command and return its printable output
    ///
    /// Progress reported along the way is prepended to the final output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let mut chunks = Vec::new();
        let last = self.execute_streaming(command, &mut |chunk: String| chunks.push(chunk))?;
        chunks.push(last);
        Ok(chunks.join("\n"))
    }

    /// Run one command, handing intermediate output to `progress` as it is produced
    pub fn execute_streaming(
        &self,
        command: &Commands,
        progress: &mut dyn FnMut(String),
    ) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        let result = self.execute_inner(command, progress);
        info!(
            command = %name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis(),
            "Command finished"
        );
        result
    }

    fn execute_inner(
        &self,
        command: &Commands,
        progress: &mut dyn FnMut(String),
    ) -> Result<String, ApiError> {
        match command {
            Commands::Hash { dir } => {
                let snapshot = self.scanner(dir).scan()?;
                Ok(hash_to_hex(&snapshot.root_hash()))
            }
            Commands::Diff { old, new, format } => self.handle_diff(old, new, *format),
            Commands::Dirtab { command } => self.handle_dirtab_command(command, progress),
        }
    }

    fn scanner(&self, dir: &Path) -> FsScanner {
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.workspace_root.join(dir)
        };
        FsScanner::with_config(dir, self.config.scan.clone())
    }

    fn handle_diff(&self, old: &Path, new: &Path, format: OutputFormat) -> Result<String, ApiError> {
        let repository = SnapshotRepository::new();
        let old_root = repository.insert(self.scanner(old).scan()?);
        let new_root = repository.insert(self.scanner(new).scan()?);

        let differ = TreeDiffer::open(&repository, &old_root, &new_root)
            .map_err(crate::error::DiffError::from)?;
        let mut events = Vec::new();
        let stats = differ.compute(&mut events)?;

        let report = DiffReport {
            old_root,
            new_root,
            events,
            stats,
        };
        match format {
            OutputFormat::Text => Ok(format_diff_text(&report)),
            OutputFormat::Json => format_diff_json(&report),
        }
    }

    fn handle_dirtab_command(
        &self,
        command: &DirtabCommands,
        progress: &mut dyn FnMut(String),
    ) -> Result<String, ApiError> {
        match command {
            DirtabCommands::Check { file, format } => {
                let dirtab = Dirtab::from_file(file)?;
                match format {
                    OutputFormat::Text => Ok(format_check_text(file, &dirtab)),
                    OutputFormat::Json => format_check_json(file, &dirtab),
                }
            }
            DirtabCommands::Match { file, paths } => {
                let paths = normalize_catalog_paths(paths)?;
                let dirtab = Dirtab::from_file(file)?;
                Ok(format_match_text(&dirtab, &paths))
            }
            DirtabCommands::Watch {
                file,
                paths,
                max_reloads,
            } => self.handle_dirtab_watch(file, paths, *max_reloads, progress),
        }
    }

    /// Report verdicts now and after every change to the rule file
    fn handle_dirtab_watch(
        &self,
        file: &Path,
        paths: &[String],
        max_reloads: Option<usize>,
        progress: &mut dyn FnMut(String),
    ) -> Result<String, ApiError> {
        let paths = normalize_catalog_paths(paths)?;
        let dirtab = Dirtab::from_file(file)?;

        let (tx, rx) = mpsc::channel::<()>();
        let mut watcher = FileWatcher::new();
        watcher.register_handler(file, move |_event: &FileEvent| tx.send(()).is_ok());
        watcher.start()?;

        // Watching before the first report so that no edit after it is missed
        progress(format_match_text(&dirtab, &paths));

        let debounce = Duration::from_millis(self.config.watch.debounce_ms);
        let mut reloads = 0usize;
        while max_reloads.map_or(true, |max| reloads < max) {
            if rx.recv().is_err() {
                warn!("Watcher stopped delivering events");
                break;
            }
            // Fold bursts (editor save = truncate + write + rename) into one reload
            while rx.recv_timeout(debounce).is_ok() {}

            match Dirtab::from_file(file) {
                Ok(dirtab) => {
                    reloads += 1;
                    progress(format_reload_text(reloads, &dirtab, &paths));
                }
                Err(e) => warn!(error = %e, "Could not reload dirtab"),
            }
        }

        watcher.stop();
        Ok(format!("Stopped after {} reload(s)", reloads))
    }
}

/// Parse command-line paths into their normalized catalog form
fn normalize_catalog_paths(paths: &[String]) -> Result<Vec<CatalogPath>, ApiError> {
    paths
        .iter()
        .map(|p| CatalogPath::parse(p).map_err(ApiError::from))
        .collect()
}
