//! Core types shared by the catalog, diff and rule modules.

/// Hash: 256-bit BLAKE3 digest used for content and subtree addressing
pub type Hash = [u8; 32];

/// Render a hash the way it is printed in logs and CLI output
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64 character hex string back into a hash
pub fn hash_from_hex(s: &str) -> Option<Hash> {
    let bytes = hex::decode(s.trim()).ok()?;
    bytes.try_into().ok()
}
