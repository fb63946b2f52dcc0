//! Directory entry and extended attribute types

use crate::types::Hash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a catalog node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    /// Stable discriminator fed into entry hashes
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
        }
    }
}

/// Immutable snapshot of one catalog node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    /// Content hash, present for regular files only
    #[serde(with = "opt_hex", default)]
    pub content_hash: Option<Hash>,
    /// Permission bits (lower 12 bits of st_mode)
    pub mode: u32,
    /// Symlink target, present for symlinks only
    #[serde(default)]
    pub symlink: Option<String>,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>, size: u64, content_hash: Hash, mode: u32) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            content_hash: Some(content_hash),
            mode,
            symlink: None,
        }
    }

    pub fn directory(name: impl Into<String>, mode: u32) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            content_hash: None,
            mode,
            symlink: None,
        }
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            name: name.into(),
            kind: EntryKind::Symlink,
            size: target.len() as u64,
            content_hash: None,
            mode: 0o777,
            symlink: Some(target),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Structural comparison used by the differ
    ///
    /// Compares kind, size, content hash, permission bits and link target.
    /// The name is the merge key and extended attributes are orthogonal, so
    /// neither takes part.
    pub fn same_metadata(&self, other: &DirectoryEntry) -> bool {
        self.kind == other.kind
            && self.size == other.size
            && self.content_hash == other.content_hash
            && self.mode == other.mode
            && self.symlink == other.symlink
    }
}

/// Extended attributes attached to an entry, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XattrList(BTreeMap<String, Vec<u8>>);

impl XattrList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

mod opt_hex {
    use crate::types::Hash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Hash>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(hash) => serializer.serialize_some(&hex::encode(hash)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Hash>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => crate::types::hash_from_hex(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid content hash: {}", s))),
        }
    }
}
