//! Property-based tests for snapshot hashing and differencing

use proptest::prelude::*;
use snapcat::catalog::{Snapshot, SnapshotBuilder};
use snapcat::diff::TreeDiffer;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type Files = BTreeMap<String, Vec<u8>>;

/// Files at "/d<n>/<name>" so that no file is ever another file's parent
fn files_strategy() -> impl Strategy<Value = Files> {
    prop::collection::btree_map(
        ("[0-2]", "[a-d]{1,2}").prop_map(|(dir, name)| format!("/d{}/{}", dir, name)),
        prop::collection::vec(any::<u8>(), 0..4),
        0..10,
    )
}

fn build(files: &Files) -> Snapshot {
    let mut builder = SnapshotBuilder::new();
    for (path, content) in files {
        builder.add_file(path, content, 0o644).unwrap();
    }
    builder.build().unwrap()
}

proptest! {
    #[test]
    fn insertion_order_does_not_change_root(files in files_strategy()) {
        let mut reversed = SnapshotBuilder::new();
        for (path, content) in files.iter().rev() {
            reversed.add_file(path, content, 0o644).unwrap();
        }
        prop_assert_eq!(build(&files).root_hash(), reversed.build().unwrap().root_hash());
    }

    #[test]
    fn diff_with_itself_is_empty(files in files_strategy()) {
        let events = TreeDiffer::new(Arc::new(build(&files)), Arc::new(build(&files)))
            .collect()
            .unwrap();
        prop_assert!(events.is_empty());
    }

    #[test]
    fn file_events_match_set_difference(old in files_strategy(), new in files_strategy()) {
        let events = TreeDiffer::new(Arc::new(build(&old)), Arc::new(build(&new)))
            .collect()
            .unwrap();

        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        let mut modified = BTreeSet::new();
        for event in &events {
            let path = event.path().to_string();
            if path.matches('/').count() != 2 {
                continue;
            }
            match event.kind() {
                "add" => added.insert(path),
                "remove" => removed.insert(path),
                _ => modified.insert(path),
            };
        }

        let expected_added: BTreeSet<String> =
            new.keys().filter(|k| !old.contains_key(*k)).cloned().collect();
        let expected_removed: BTreeSet<String> =
            old.keys().filter(|k| !new.contains_key(*k)).cloned().collect();
        let expected_modified: BTreeSet<String> = old
            .iter()
            .filter(|(k, v)| new.get(*k).map_or(false, |n| n != *v))
            .map(|(k, _)| k.clone())
            .collect();

        prop_assert_eq!(added, expected_added);
        prop_assert_eq!(removed, expected_removed);
        prop_assert_eq!(modified, expected_modified);
        prop_assert_eq!(events.is_empty(), old == new);
    }
}
