//! Filesystem scanner that turns a local directory into a catalog snapshot

use crate::catalog::entry::{DirectoryEntry, XattrList};
use crate::catalog::hasher;
use crate::catalog::path::CatalogPath;
use crate::catalog::store::{Snapshot, SnapshotBuilder};
use crate::error::StorageError;
use crate::types::hash_to_hex;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, trace};
use walkdir::{DirEntry, WalkDir};

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether to follow symbolic links (default: false, links become symlink entries)
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Entry names to skip wherever they appear (e.g., ".git")
    ///
    /// Names are compared exactly; `*` and `?` have no special meaning here.
    #[serde(default = "default_ignore_names")]
    pub ignore_names: Vec<String>,
    /// Maximum depth to traverse (None = unlimited)
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_ignore_names() -> Vec<String> {
    vec![".git".to_string(), ".svn".to_string()]
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_names: default_ignore_names(),
            max_depth: None,
        }
    }
}

/// Builds a `Snapshot` from a directory on the local filesystem
pub struct FsScanner {
    root: PathBuf,
    config: ScanConfig,
}

impl FsScanner {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(root: PathBuf, config: ScanConfig) -> Self {
        Self { root, config }
    }

    /// Walk the directory and build a snapshot of everything below it
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> Result<Snapshot, StorageError> {
        let start = Instant::now();
        let root = dunce::canonicalize(&self.root).map_err(|e| {
            StorageError::InvalidPath(format!("Failed to canonicalize {:?}: {}", self.root, e))
        })?;
        let root_meta = std::fs::metadata(&root)?;
        if !root_meta.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "scan root is not a directory: {}",
                root.display()
            )));
        }

        let mut builder = SnapshotBuilder::new().with_root_mode(permission_bits(&root_meta, 0o755));

        let walker = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_ignore(e));

        let mut count = 0usize;
        for entry in walker {
            let entry = entry.map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to walk directory: {}", e),
                ))
            })?;
            if entry.depth() == 0 {
                continue;
            }

            let catalog_path = to_catalog_path(&root, entry.path())?;
            let name = catalog_path.file_name().unwrap_or_default().to_string();
            let metadata = entry.metadata().map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to read metadata for {:?}: {}", entry.path(), e),
                ))
            })?;

            let dir_entry = if entry.path_is_symlink() && !self.config.follow_symlinks {
                let target = std::fs::read_link(entry.path())?;
                DirectoryEntry::symlink(name, target.to_string_lossy().to_string())
            } else if metadata.is_dir() {
                DirectoryEntry::directory(name, permission_bits(&metadata, 0o755))
            } else if metadata.is_file() {
                self.hash_file(entry.path(), name, &metadata)?
            } else {
                // Sockets, fifos and devices have no catalog representation
                trace!(path = %entry.path().display(), "Skipping special file");
                continue;
            };

            builder.insert(catalog_path, dir_entry, XattrList::new())?;
            count += 1;
        }

        let snapshot = builder.build()?;
        info!(
            entry_count = count,
            root_hash = %hash_to_hex(&snapshot.root_hash()),
            duration_ms = start.elapsed().as_millis(),
            "Scan completed"
        );
        Ok(snapshot)
    }

    fn hash_file(&self, path: &Path, name: String, metadata: &Metadata) -> Result<DirectoryEntry, StorageError> {
        let content = std::fs::read(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read file {:?}: {}", path, e),
            ))
        })?;
        let content_hash = hasher::compute_content_hash(&content);
        debug!(path = %path.display(), content_hash = %hash_to_hex(&content_hash), "Hashed file");
        Ok(DirectoryEntry::file(
            name,
            content.len() as u64,
            content_hash,
            permission_bits(metadata, 0o644),
        ))
    }

    /// Any path component equal to an ignored name excludes the entry and everything below it
    fn should_ignore(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.config.ignore_names.iter().any(|n| n.as_str() == name)
    }
}

fn to_catalog_path(root: &Path, path: &Path) -> Result<CatalogPath, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!("{} is outside {}", path.display(), root.display()))
    })?;
    let mut catalog_path = CatalogPath::root();
    for component in relative.components() {
        let name = component.as_os_str().to_str().ok_or_else(|| {
            StorageError::InvalidPath(format!("non UTF-8 path: {}", path.display()))
        })?;
        catalog_path = catalog_path.join(name)?;
    }
    Ok(catalog_path)
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata, _default: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata, default: u32) -> u32 {
    if metadata.permissions().readonly() {
        default & !0o222
    } else {
        default
    }
}
