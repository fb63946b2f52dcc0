//! Catalog entry stores
//!
//! `CatalogEntryStore` is the read interface the differ consumes: ordered
//! directory listings plus the subtree hash used for pruning. `Snapshot` is the
//! in-memory implementation, built bottom-up by `SnapshotBuilder`, and
//! `SnapshotRepository` resolves root hashes to snapshots.

use crate::catalog::entry::{DirectoryEntry, XattrList};
use crate::catalog::hasher;
use crate::catalog::path::CatalogPath;
use crate::error::{FetchError, StorageError};
use crate::types::{hash_to_hex, Hash};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One child returned by a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogChild {
    pub entry: DirectoryEntry,
    pub xattrs: XattrList,
}

/// Read interface over one snapshot
pub trait CatalogEntryStore {
    /// Children of the directory at `path`, sorted by name
    fn list_children(&self, path: &CatalogPath) -> Result<Vec<CatalogChild>, FetchError>;

    /// Subtree hash for directories, entry hash otherwise
    fn entry_hash(&self, path: &CatalogPath) -> Result<Hash, FetchError>;
}

impl<T: CatalogEntryStore + ?Sized> CatalogEntryStore for Arc<T> {
    fn list_children(&self, path: &CatalogPath) -> Result<Vec<CatalogChild>, FetchError> {
        (**self).list_children(path)
    }

    fn entry_hash(&self, path: &CatalogPath) -> Result<Hash, FetchError> {
        (**self).entry_hash(path)
    }
}

/// Shared handle to a store bound to one snapshot
pub type SharedStore = Arc<dyn CatalogEntryStore + Send + Sync>;

/// Resolves a root hash to a store bound to that snapshot
pub trait CatalogRepository {
    fn open(&self, root_hash: &Hash) -> Result<SharedStore, FetchError>;
}

#[derive(Debug, Clone)]
struct SnapshotNode {
    entry: DirectoryEntry,
    xattrs: XattrList,
    /// Hash of the entry as listed in its parent
    entry_hash: Hash,
    /// Set for directories only
    subtree_hash: Option<Hash>,
    /// Child names in sorted order (directories only)
    children: Vec<String>,
}

/// Immutable in-memory catalog snapshot
#[derive(Debug, Clone)]
pub struct Snapshot {
    root_hash: Hash,
    nodes: HashMap<CatalogPath, SnapshotNode>,
}

impl Snapshot {
    pub fn root_hash(&self) -> Hash {
        self.root_hash
    }

    /// Number of entries below the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, path: &CatalogPath) -> Option<(&DirectoryEntry, &XattrList)> {
        if path.is_root() {
            return None;
        }
        self.nodes.get(path).map(|n| (&n.entry, &n.xattrs))
    }

    /// All paths below the root, sorted
    pub fn paths(&self) -> Vec<CatalogPath> {
        let mut paths: Vec<_> = self
            .nodes
            .keys()
            .filter(|p| !p.is_root())
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    fn node(&self, path: &CatalogPath) -> Result<&SnapshotNode, FetchError> {
        self.nodes
            .get(path)
            .ok_or_else(|| FetchError::PathNotFound(path.clone()))
    }
}

impl CatalogEntryStore for Snapshot {
    fn list_children(&self, path: &CatalogPath) -> Result<Vec<CatalogChild>, FetchError> {
        let node = self.node(path)?;
        if !node.entry.is_directory() {
            return Err(FetchError::NotADirectory(path.clone()));
        }
        node.children
            .iter()
            .map(|name| {
                let child = self.node(&path.child(name))?;
                Ok(CatalogChild {
                    entry: child.entry.clone(),
                    xattrs: child.xattrs.clone(),
                })
            })
            .collect()
    }

    fn entry_hash(&self, path: &CatalogPath) -> Result<Hash, FetchError> {
        let node = self.node(path)?;
        Ok(node.subtree_hash.unwrap_or(node.entry_hash))
    }
}

/// Builder for in-memory snapshots
///
/// Missing parent directories are created with mode 0755. Hashes are computed
/// once in `build`, deepest directories first.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    root_mode: u32,
    entries: BTreeMap<CatalogPath, (DirectoryEntry, XattrList)>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            root_mode: 0o755,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_root_mode(mut self, mode: u32) -> Self {
        self.root_mode = mode;
        self
    }

    /// Add a regular file, hashing `content` for its content hash
    pub fn add_file(&mut self, path: &str, content: &[u8], mode: u32) -> Result<&mut Self, StorageError> {
        let entry = DirectoryEntry::file(String::new(), content.len() as u64, hasher::compute_content_hash(content), mode);
        self.add_entry(path, entry, XattrList::new())
    }

    pub fn add_directory(&mut self, path: &str, mode: u32) -> Result<&mut Self, StorageError> {
        self.add_entry(path, DirectoryEntry::directory(String::new(), mode), XattrList::new())
    }

    pub fn add_symlink(&mut self, path: &str, target: &str) -> Result<&mut Self, StorageError> {
        self.add_entry(path, DirectoryEntry::symlink(String::new(), target), XattrList::new())
    }

    /// Add an arbitrary entry; its name is taken from the last path component
    pub fn add_entry(
        &mut self,
        path: &str,
        mut entry: DirectoryEntry,
        xattrs: XattrList,
    ) -> Result<&mut Self, StorageError> {
        let path = CatalogPath::parse(path)?;
        let name = path
            .file_name()
            .ok_or_else(|| StorageError::InvalidPath("cannot add an entry for the root".to_string()))?
            .to_string();
        entry.name = name;
        self.insert(path, entry, xattrs)?;
        Ok(self)
    }

    pub(crate) fn insert(
        &mut self,
        path: CatalogPath,
        entry: DirectoryEntry,
        xattrs: XattrList,
    ) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.is_root() {
                match self.entries.get(&parent) {
                    Some((existing, _)) if !existing.is_directory() => {
                        return Err(StorageError::InvalidPath(format!(
                            "parent of {} is not a directory",
                            path
                        )));
                    }
                    Some(_) => {}
                    None => {
                        let name = parent.file_name().unwrap_or_default().to_string();
                        self.insert(parent, DirectoryEntry::directory(name, 0o755), XattrList::new())?;
                    }
                }
            }
        }
        self.entries.insert(path, (entry, xattrs));
        Ok(())
    }

    /// Compute all hashes and freeze the snapshot
    #[instrument(skip(self), fields(entries = self.entries.len()))]
    pub fn build(&self) -> Result<Snapshot, StorageError> {
        let mut children: HashMap<CatalogPath, Vec<String>> = HashMap::new();
        children.insert(CatalogPath::root(), Vec::new());

        for (path, (entry, _)) in &self.entries {
            if entry.is_directory() {
                children.entry(path.clone()).or_default();
            }
        }
        for path in self.entries.keys() {
            let parent = path.parent().unwrap_or_else(CatalogPath::root);
            let name = path.file_name().unwrap_or_default().to_string();
            match children.get_mut(&parent) {
                Some(list) => list.push(name),
                None => {
                    return Err(StorageError::InvalidPath(format!(
                        "parent of {} is not a directory",
                        path
                    )))
                }
            }
        }
        for list in children.values_mut() {
            list.sort();
        }

        // Deepest first so every child hash exists before its parent needs it
        let mut ordered: Vec<&CatalogPath> = self.entries.keys().collect();
        ordered.sort_by(|a, b| b.depth().cmp(&a.depth()));

        let mut nodes: HashMap<CatalogPath, SnapshotNode> = HashMap::with_capacity(self.entries.len() + 1);
        for path in ordered {
            let (entry, xattrs) = &self.entries[path];
            let (subtree_hash, child_names) = if entry.is_directory() {
                let names = children.remove(path).unwrap_or_default();
                let subtree = subtree_hash_of(path, &names, &nodes);
                (Some(subtree), names)
            } else {
                (None, Vec::new())
            };
            let entry_hash = hasher::compute_entry_hash(entry, xattrs, subtree_hash.as_ref());
            nodes.insert(
                path.clone(),
                SnapshotNode {
                    entry: entry.clone(),
                    xattrs: xattrs.clone(),
                    entry_hash,
                    subtree_hash,
                    children: child_names,
                },
            );
        }

        let root = CatalogPath::root();
        let root_children = children.remove(&root).unwrap_or_default();
        let root_hash = subtree_hash_of(&root, &root_children, &nodes);
        let root_entry = DirectoryEntry::directory(String::new(), self.root_mode);
        let root_entry_hash = hasher::compute_entry_hash(&root_entry, &XattrList::new(), Some(&root_hash));
        nodes.insert(
            root,
            SnapshotNode {
                entry: root_entry,
                xattrs: XattrList::new(),
                entry_hash: root_entry_hash,
                subtree_hash: Some(root_hash),
                children: root_children,
            },
        );

        debug!(root_hash = %hash_to_hex(&root_hash), "Snapshot built");
        Ok(Snapshot { root_hash, nodes })
    }
}

fn subtree_hash_of(
    dir: &CatalogPath,
    names: &[String],
    nodes: &HashMap<CatalogPath, SnapshotNode>,
) -> Hash {
    let hashed: Vec<(&str, Hash)> = names
        .iter()
        .filter_map(|name| {
            nodes
                .get(&dir.child(name))
                .map(|node| (name.as_str(), node.entry_hash))
        })
        .collect();
    hasher::compute_subtree_hash(&hashed)
}

/// In-memory repository of snapshots keyed by root hash
#[derive(Default)]
pub struct SnapshotRepository {
    snapshots: RwLock<HashMap<Hash, Arc<Snapshot>>>,
}

impl SnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot and return its root hash
    pub fn insert(&self, snapshot: Snapshot) -> Hash {
        let root = snapshot.root_hash();
        self.snapshots.write().insert(root, Arc::new(snapshot));
        root
    }

    pub fn contains(&self, root_hash: &Hash) -> bool {
        self.snapshots.read().contains_key(root_hash)
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogRepository for SnapshotRepository {
    fn open(&self, root_hash: &Hash) -> Result<SharedStore, FetchError> {
        let snapshot = self
            .snapshots
            .read()
            .get(root_hash)
            .cloned()
            .ok_or_else(|| FetchError::RootNotFound(hash_to_hex(root_hash)))?;
        Ok(snapshot as SharedStore)
    }
}
