//! Snapshot differencing
//!
//! `TreeDiffer` walks two catalog snapshots in lock-step from `/` and reports
//! every added, removed and modified entry. Directories whose subtree hashes
//! agree on both sides are skipped without being listed.

pub mod sink;

pub use sink::{DiffEvent, DiffSink, FnSink};

use crate::catalog::{CatalogChild, CatalogPath, CatalogRepository, SharedStore};
use crate::error::{DiffError, FetchError};
use crate::types::{hash_to_hex, Hash};
use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, info, instrument, trace};

/// Which sides of a directory pair are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sides {
    Both,
    OldOnly,
    NewOnly,
}

impl Sides {
    fn has_old(self) -> bool {
        self != Sides::NewOnly
    }

    fn has_new(self) -> bool {
        self != Sides::OldOnly
    }
}

/// Counters for one `compute` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    /// Directories skipped because their subtree hashes matched
    pub pruned: usize,
    /// Directories listed on at least one side
    pub directories_visited: usize,
}

impl DiffStats {
    pub fn total_changes(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// Computes the difference between two snapshots
pub struct TreeDiffer {
    old: SharedStore,
    new: SharedStore,
}

impl TreeDiffer {
    /// Diff two stores directly
    pub fn new(old: SharedStore, new: SharedStore) -> Self {
        Self { old, new }
    }

    /// Resolve both root hashes through a repository
    pub fn open(
        repository: &dyn CatalogRepository,
        old_root: &Hash,
        new_root: &Hash,
    ) -> Result<Self, FetchError> {
        let old = repository.open(old_root)?;
        let new = repository.open(new_root)?;
        Ok(Self::new(old, new))
    }

    /// Walk both snapshots and report every difference into `sink`
    ///
    /// Any fetch or sink failure aborts the traversal; events already
    /// delivered are not retracted, so callers that need an all-or-nothing
    /// result should buffer (see `collect`).
    #[instrument(skip(self, sink))]
    pub fn compute(&self, sink: &mut dyn DiffSink) -> Result<DiffStats, DiffError> {
        let start = Instant::now();
        let root = CatalogPath::root();
        let mut stats = DiffStats::default();

        let old_root = self.old.entry_hash(&root)?;
        let new_root = self.new.entry_hash(&root)?;
        if old_root == new_root {
            stats.pruned = 1;
            debug!(root_hash = %hash_to_hex(&old_root), "Root hashes match, nothing to diff");
            return Ok(stats);
        }

        self.diff_directory(&root, Sides::Both, sink, &mut stats)?;

        info!(
            old_root = %hash_to_hex(&old_root),
            new_root = %hash_to_hex(&new_root),
            added = stats.added,
            removed = stats.removed,
            modified = stats.modified,
            pruned = stats.pruned,
            directories_visited = stats.directories_visited,
            duration_ms = start.elapsed().as_millis(),
            "Diff completed"
        );
        Ok(stats)
    }

    /// Run `compute` into a buffer, returning the events only if the whole walk succeeded
    pub fn collect(&self) -> Result<Vec<DiffEvent>, DiffError> {
        let mut events = Vec::new();
        self.compute(&mut events)?;
        Ok(events)
    }

    fn list(&self, store: &SharedStore, path: &CatalogPath, present: bool) -> Result<Vec<CatalogChild>, FetchError> {
        if present {
            store.list_children(path)
        } else {
            Ok(Vec::new())
        }
    }

    fn diff_directory(
        &self,
        path: &CatalogPath,
        sides: Sides,
        sink: &mut dyn DiffSink,
        stats: &mut DiffStats,
    ) -> Result<(), DiffError> {
        let old_children = self.list(&self.old, path, sides.has_old())?;
        let new_children = self.list(&self.new, path, sides.has_new())?;
        stats.directories_visited += 1;
        trace!(
            path = %path,
            old = old_children.len(),
            new = new_children.len(),
            "Merging directory listings"
        );

        // Both listings are sorted by name, so a two-pointer merge pairs them up
        let (mut i, mut j) = (0, 0);
        loop {
            let order = match (old_children.get(i), new_children.get(j)) {
                (None, None) => break,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(o), Some(n)) => o.entry.name.cmp(&n.entry.name),
            };

            match order {
                Ordering::Less => {
                    self.report_removal(path, &old_children[i], sink, stats)?;
                    i += 1;
                }
                Ordering::Greater => {
                    self.report_addition(path, &new_children[j], sink, stats)?;
                    j += 1;
                }
                Ordering::Equal => {
                    self.compare_pair(path, &old_children[i], &new_children[j], sink, stats)?;
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(())
    }

    fn report_addition(
        &self,
        parent: &CatalogPath,
        child: &CatalogChild,
        sink: &mut dyn DiffSink,
        stats: &mut DiffStats,
    ) -> Result<(), DiffError> {
        let path = parent.child(&child.entry.name);
        sink.on_add(&path, &child.entry, &child.xattrs)?;
        stats.added += 1;
        if child.entry.is_directory() {
            self.diff_directory(&path, Sides::NewOnly, sink, stats)?;
        }
        Ok(())
    }

    fn report_removal(
        &self,
        parent: &CatalogPath,
        child: &CatalogChild,
        sink: &mut dyn DiffSink,
        stats: &mut DiffStats,
    ) -> Result<(), DiffError> {
        let path = parent.child(&child.entry.name);
        sink.on_remove(&path, &child.entry)?;
        stats.removed += 1;
        if child.entry.is_directory() {
            self.diff_directory(&path, Sides::OldOnly, sink, stats)?;
        }
        Ok(())
    }

    fn compare_pair(
        &self,
        parent: &CatalogPath,
        old: &CatalogChild,
        new: &CatalogChild,
        sink: &mut dyn DiffSink,
        stats: &mut DiffStats,
    ) -> Result<(), DiffError> {
        let path = parent.child(&new.entry.name);
        let both_directories = old.entry.is_directory() && new.entry.is_directory();

        if !old.entry.same_metadata(&new.entry) {
            sink.on_modify(&path, &old.entry, &new.entry)?;
            stats.modified += 1;
        }

        // A kind change between directory and non-directory is reported once, without its subtree
        if !both_directories {
            return Ok(());
        }

        // Equal subtree hashes mean nothing below changed, even if the directory itself did
        let old_hash = self.old.entry_hash(&path)?;
        let new_hash = self.new.entry_hash(&path)?;
        if old_hash == new_hash {
            stats.pruned += 1;
            debug!(path = %path, "Subtree unchanged, pruned");
            return Ok(());
        }
        self.diff_directory(&path, Sides::Both, sink, stats)
    }
}
