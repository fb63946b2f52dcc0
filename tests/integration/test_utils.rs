//! Shared helpers for integration tests

use parking_lot::Mutex;
use snapcat::catalog::{CatalogChild, CatalogEntryStore, CatalogPath, SharedStore};
use snapcat::error::FetchError;
use snapcat::types::Hash;
use std::sync::Arc;

/// Serializes tests that touch process environment variables
pub static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

/// Store wrapper that records every directory listing
pub struct CountingStore {
    inner: SharedStore,
    listed: Mutex<Vec<String>>,
}

impl CountingStore {
    pub fn wrap(inner: SharedStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            listed: Mutex::new(Vec::new()),
        })
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().clone()
    }
}

impl CatalogEntryStore for CountingStore {
    fn list_children(&self, path: &CatalogPath) -> Result<Vec<CatalogChild>, FetchError> {
        self.listed.lock().push(path.to_string());
        self.inner.list_children(path)
    }

    fn entry_hash(&self, path: &CatalogPath) -> Result<Hash, FetchError> {
        self.inner.entry_hash(path)
    }
}
