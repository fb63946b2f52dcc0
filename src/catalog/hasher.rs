//! Hash computation for catalog entries using BLAKE3
//!
//! Directory subtree hashes cover every child entry (metadata, xattrs and, for
//! directories, their own subtree hash), so the root hash of a snapshot is a
//! pure function of every reachable (path, entry, xattrs) tuple.

use crate::catalog::entry::{DirectoryEntry, XattrList};
use crate::types::Hash;
use blake3::Hasher;

/// Compute the hash of one entry as seen from its parent directory
///
/// EntryHash = hash("entry" || name || kind || size || content_hash || mode || target || xattrs || subtree)
///
/// `subtree` is the directory's subtree hash and must be `None` for files and symlinks.
pub fn compute_entry_hash(
    entry: &DirectoryEntry,
    xattrs: &XattrList,
    subtree: Option<&Hash>,
) -> Hash {
    let mut hasher = Hasher::new();

    hasher.update(b"entry");
    update_len_prefixed(&mut hasher, entry.name.as_bytes());
    update_len_prefixed(&mut hasher, entry.kind.as_str().as_bytes());
    hasher.update(&entry.size.to_be_bytes());

    match &entry.content_hash {
        Some(hash) => {
            hasher.update(&[1]);
            hasher.update(hash);
        }
        None => {
            hasher.update(&[0]);
        }
    }

    hasher.update(&entry.mode.to_be_bytes());

    match &entry.symlink {
        Some(target) => {
            hasher.update(&[1]);
            update_len_prefixed(&mut hasher, target.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }

    // Sorted by name already
    hasher.update(&(xattrs.len() as u64).to_be_bytes());
    for (name, value) in xattrs.iter() {
        update_len_prefixed(&mut hasher, name.as_bytes());
        update_len_prefixed(&mut hasher, value);
    }

    if let Some(subtree) = subtree {
        hasher.update(b"subtree");
        hasher.update(subtree);
    }

    *hasher.finalize().as_bytes()
}

/// Compute the subtree hash of a directory's contents
///
/// SubtreeHash = hash("directory" || children_count || (name || entry_hash)*)
///
/// Children must be sorted by name.
pub fn compute_subtree_hash(children: &[(&str, Hash)]) -> Hash {
    debug_assert!(
        children.windows(2).all(|w| w[0].0 < w[1].0),
        "children must be sorted by name"
    );

    let mut hasher = Hasher::new();
    hasher.update(b"directory");
    hasher.update(&(children.len() as u64).to_be_bytes());
    for (name, entry_hash) in children {
        update_len_prefixed(&mut hasher, name.as_bytes());
        hasher.update(entry_hash);
    }
    *hasher.finalize().as_bytes()
}

/// Compute content hash for file bytes
pub fn compute_content_hash(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

fn update_len_prefixed(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
