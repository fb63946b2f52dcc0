//! Diff sinks
//!
//! A sink receives the add/remove/modify events of one `TreeDiffer::compute`
//! call. Returning an error from any hook aborts the whole traversal.

use crate::catalog::{CatalogPath, DirectoryEntry, XattrList};
use crate::error::DiffError;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// Receiver of diff events
pub trait DiffSink {
    fn on_add(
        &mut self,
        path: &CatalogPath,
        entry: &DirectoryEntry,
        xattrs: &XattrList,
    ) -> Result<(), DiffError>;

    fn on_remove(&mut self, path: &CatalogPath, entry: &DirectoryEntry) -> Result<(), DiffError>;

    fn on_modify(
        &mut self,
        path: &CatalogPath,
        old_entry: &DirectoryEntry,
        new_entry: &DirectoryEntry,
    ) -> Result<(), DiffError>;
}

/// One reported difference, as an owned message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum DiffEvent {
    Add {
        path: CatalogPath,
        entry: DirectoryEntry,
        xattrs: XattrList,
    },
    Remove {
        path: CatalogPath,
        entry: DirectoryEntry,
    },
    Modify {
        path: CatalogPath,
        old: DirectoryEntry,
        new: DirectoryEntry,
    },
}

impl DiffEvent {
    pub fn add(path: &CatalogPath, entry: &DirectoryEntry, xattrs: &XattrList) -> Self {
        DiffEvent::Add {
            path: path.clone(),
            entry: entry.clone(),
            xattrs: xattrs.clone(),
        }
    }

    pub fn remove(path: &CatalogPath, entry: &DirectoryEntry) -> Self {
        DiffEvent::Remove {
            path: path.clone(),
            entry: entry.clone(),
        }
    }

    pub fn modify(path: &CatalogPath, old: &DirectoryEntry, new: &DirectoryEntry) -> Self {
        DiffEvent::Modify {
            path: path.clone(),
            old: old.clone(),
            new: new.clone(),
        }
    }

    pub fn path(&self) -> &CatalogPath {
        match self {
            DiffEvent::Add { path, .. }
            | DiffEvent::Remove { path, .. }
            | DiffEvent::Modify { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DiffEvent::Add { .. } => "add",
            DiffEvent::Remove { .. } => "remove",
            DiffEvent::Modify { .. } => "modify",
        }
    }
}

impl DiffSink for Vec<DiffEvent> {
    fn on_add(&mut self, path: &CatalogPath, entry: &DirectoryEntry, xattrs: &XattrList) -> Result<(), DiffError> {
        self.push(DiffEvent::add(path, entry, xattrs));
        Ok(())
    }

    fn on_remove(&mut self, path: &CatalogPath, entry: &DirectoryEntry) -> Result<(), DiffError> {
        self.push(DiffEvent::remove(path, entry));
        Ok(())
    }

    fn on_modify(
        &mut self,
        path: &CatalogPath,
        old_entry: &DirectoryEntry,
        new_entry: &DirectoryEntry,
    ) -> Result<(), DiffError> {
        self.push(DiffEvent::modify(path, old_entry, new_entry));
        Ok(())
    }
}

/// Channel sink; a disconnected receiver aborts the diff
impl DiffSink for Sender<DiffEvent> {
    fn on_add(&mut self, path: &CatalogPath, entry: &DirectoryEntry, xattrs: &XattrList) -> Result<(), DiffError> {
        send(self, DiffEvent::add(path, entry, xattrs))
    }

    fn on_remove(&mut self, path: &CatalogPath, entry: &DirectoryEntry) -> Result<(), DiffError> {
        send(self, DiffEvent::remove(path, entry))
    }

    fn on_modify(
        &mut self,
        path: &CatalogPath,
        old_entry: &DirectoryEntry,
        new_entry: &DirectoryEntry,
    ) -> Result<(), DiffError> {
        send(self, DiffEvent::modify(path, old_entry, new_entry))
    }
}

fn send(tx: &Sender<DiffEvent>, event: DiffEvent) -> Result<(), DiffError> {
    tx.send(event)
        .map_err(|e| DiffError::Sink(format!("event receiver disconnected at {}", e.0.path())))
}

/// Adapts a closure over owned events into a sink
pub struct FnSink<F>(pub F);

impl<F> DiffSink for FnSink<F>
where
    F: FnMut(DiffEvent) -> Result<(), DiffError>,
{
    fn on_add(&mut self, path: &CatalogPath, entry: &DirectoryEntry, xattrs: &XattrList) -> Result<(), DiffError> {
        (self.0)(DiffEvent::add(path, entry, xattrs))
    }

    fn on_remove(&mut self, path: &CatalogPath, entry: &DirectoryEntry) -> Result<(), DiffError> {
        (self.0)(DiffEvent::remove(path, entry))
    }

    fn on_modify(
        &mut self,
        path: &CatalogPath,
        old_entry: &DirectoryEntry,
        new_entry: &DirectoryEntry,
    ) -> Result<(), DiffError> {
        (self.0)(DiffEvent::modify(path, old_entry, new_entry))
    }
}
