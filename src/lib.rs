//! snapcat: snapshot catalog differencing and dirtab path rules
//!
//! Directory trees are captured as content-addressed snapshots whose
//! directories carry Merkle subtree hashes. `diff::TreeDiffer` compares two
//! snapshots and skips every subtree whose hash is unchanged. `dirtab` parses
//! rule files that decide which paths become nested catalogs, and `watch`
//! reloads such files when they change.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod diff;
pub mod dirtab;
pub mod error;
pub mod logging;
pub mod types;
pub mod watch;
