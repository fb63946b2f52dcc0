//! Catalog data model
//!
//! A catalog is the hierarchical representation of one snapshot: an ordered
//! tree of directory entries rooted at a single content hash.

pub mod entry;
pub mod hasher;
pub mod path;
pub mod scan;
pub mod store;

pub use entry::{DirectoryEntry, EntryKind, XattrList};
pub use path::CatalogPath;
pub use scan::{FsScanner, ScanConfig};
pub use store::{
    CatalogChild, CatalogEntryStore, CatalogRepository, SharedStore, Snapshot, SnapshotBuilder,
    SnapshotRepository,
};
