//! Catalog path normalization
//!
//! A catalog path is absolute and `/`-separated, with no empty components and
//! no trailing slash except for the root itself. It is the merge key shared by
//! both sides of a diff and the string matched against dirtab rules.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized absolute path inside a catalog snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CatalogPath(String);

impl CatalogPath {
    /// The snapshot root, `/`
    pub fn root() -> Self {
        CatalogPath("/".to_string())
    }

    /// Parse and normalize an absolute path string
    ///
    /// Repeated slashes and `.` components are collapsed. Relative paths and
    /// `..` components are rejected, since a catalog path never leaves its
    /// snapshot.
    pub fn parse(path: &str) -> Result<Self, StorageError> {
        if !path.starts_with('/') {
            return Err(StorageError::InvalidPath(format!(
                "catalog path must be absolute: {:?}",
                path
            )));
        }

        let mut normalized = String::with_capacity(path.len());
        for component in path.split('/') {
            match component {
                "" | "." => continue,
                ".." => {
                    return Err(StorageError::InvalidPath(format!(
                        "catalog path must not contain '..': {:?}",
                        path
                    )))
                }
                name => {
                    normalized.push('/');
                    normalized.push_str(name);
                }
            }
        }

        if normalized.is_empty() {
            return Ok(Self::root());
        }
        Ok(CatalogPath(normalized))
    }

    /// Append one validated component
    pub fn join(&self, name: &str) -> Result<Self, StorageError> {
        validate_component(name)?;
        Ok(self.child(name))
    }

    /// Append a component known to be valid (names handed out by a catalog store)
    pub fn child(&self, name: &str) -> Self {
        debug_assert!(validate_component(name).is_ok(), "invalid component {:?}", name);
        if self.is_root() {
            CatalogPath(format!("/{}", name))
        } else {
            CatalogPath(format!("{}/{}", self.0, name))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last component, `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    pub fn parent(&self) -> Option<CatalogPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(CatalogPath(self.0[..idx].to_string())),
            None => None,
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Number of components below the root (root has depth 0)
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// True if `self` equals `other` or lies below it
    pub fn starts_with(&self, other: &CatalogPath) -> bool {
        if other.is_root() || self == other {
            return true;
        }
        self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/')
    }
}

/// Check that a single entry name can be used as a path component
pub fn validate_component(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(StorageError::InvalidPath(format!(
            "invalid entry name: {:?}",
            name
        )));
    }
    Ok(())
}

impl fmt::Display for CatalogPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CatalogPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CatalogPath {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CatalogPath::parse(&value)
    }
}

impl From<CatalogPath> for String {
    fn from(path: CatalogPath) -> Self {
        path.0
    }
}
