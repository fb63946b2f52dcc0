//! Integration tests for snapshot differencing

use super::test_utils::CountingStore;
use snapcat::catalog::{
    CatalogEntryStore, CatalogPath, CatalogRepository, DirectoryEntry, SharedStore, Snapshot, SnapshotBuilder, SnapshotRepository,
    XattrList,
};
use snapcat::diff::{DiffEvent, FnSink, TreeDiffer};
use snapcat::error::{DiffError, FetchError};
use std::sync::{mpsc, Arc};
use std::thread;

fn snapshot(build: impl FnOnce(&mut SnapshotBuilder)) -> Snapshot {
    let mut builder = SnapshotBuilder::new();
    build(&mut builder);
    builder.build().unwrap()
}

fn summary(events: &[DiffEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| format!("{} {}", e.kind(), e.path()))
        .collect()
}

/// Old {/a, /b/, /b/c}, new {/a', /b/, /b/c, /d}: only /a and /d are reported
/// and the unchanged /b is never listed.
#[test]
fn test_modified_file_and_added_file() {
    let old = snapshot(|b| {
        b.add_file("/a", b"one", 0o644).unwrap();
        b.add_file("/b/c", b"same", 0o644).unwrap();
    });
    let new = snapshot(|b| {
        b.add_file("/a", b"two!", 0o644).unwrap();
        b.add_file("/b/c", b"same", 0o644).unwrap();
        b.add_file("/d", b"new", 0o644).unwrap();
    });

    let old_store = CountingStore::wrap(Arc::new(old));
    let new_store = CountingStore::wrap(Arc::new(new));
    let differ = TreeDiffer::new(old_store.clone(), new_store.clone());

    let events = differ.collect().unwrap();
    assert_eq!(summary(&events), vec!["modify /a", "add /d"]);
    assert_eq!(old_store.listed(), vec!["/"]);
    assert_eq!(new_store.listed(), vec!["/"]);
}

#[test]
fn test_identical_snapshots_are_not_listed() {
    let build = |b: &mut SnapshotBuilder| {
        b.add_file("/x/y/z", b"z", 0o644).unwrap();
        b.add_symlink("/x/link", "y/z").unwrap();
    };
    let old_store = CountingStore::wrap(Arc::new(snapshot(build)));
    let new_store = CountingStore::wrap(Arc::new(snapshot(build)));

    let mut events = Vec::new();
    let stats = TreeDiffer::new(old_store.clone(), new_store.clone())
        .compute(&mut events)
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(stats.total_changes(), 0);
    assert!(old_store.listed().is_empty());
    assert!(new_store.listed().is_empty());
}

#[test]
fn test_deep_change_lists_only_the_changed_spine() {
    let old = snapshot(|b| {
        b.add_file("/usr/lib/libc.so", b"libc", 0o755).unwrap();
        b.add_file("/usr/bin/ls", b"ls", 0o755).unwrap();
        b.add_file("/etc/hosts", b"localhost", 0o644).unwrap();
    });
    let new = snapshot(|b| {
        b.add_file("/usr/lib/libc.so", b"libc", 0o755).unwrap();
        b.add_file("/usr/bin/ls", b"ls2", 0o755).unwrap();
        b.add_file("/etc/hosts", b"localhost", 0o644).unwrap();
    });

    let old_store = CountingStore::wrap(Arc::new(old));
    let differ = TreeDiffer::new(old_store.clone(), Arc::new(new));
    let mut events = Vec::new();
    let stats = differ.compute(&mut events).unwrap();

    assert_eq!(summary(&events), vec!["modify /usr/bin/ls"]);
    assert_eq!(old_store.listed(), vec!["/", "/usr", "/usr/bin"]);
    // /etc and /usr/lib
    assert_eq!(stats.pruned, 2);
}

#[test]
fn test_removed_directory_reports_whole_subtree() {
    let old = snapshot(|b| {
        b.add_file("/keep", b"k", 0o644).unwrap();
        b.add_file("/gone/inner/file", b"f", 0o644).unwrap();
    });
    let new = snapshot(|b| {
        b.add_file("/keep", b"k", 0o644).unwrap();
    });

    let events = TreeDiffer::new(Arc::new(old), Arc::new(new))
        .collect()
        .unwrap();
    assert_eq!(
        summary(&events),
        vec!["remove /gone", "remove /gone/inner", "remove /gone/inner/file"]
    );
}

#[test]
fn test_file_replaced_by_directory() {
    let old = snapshot(|b| {
        b.add_file("/thing", b"file", 0o644).unwrap();
    });
    let new = snapshot(|b| {
        b.add_file("/thing/child", b"c", 0o644).unwrap();
    });

    let events = TreeDiffer::new(Arc::new(old), Arc::new(new))
        .collect()
        .unwrap();
    assert_eq!(summary(&events), vec!["modify /thing"]);
}

#[test]
fn test_directory_mode_change_does_not_list_its_subtree() {
    let old = snapshot(|b| {
        b.add_directory("/usr", 0o755).unwrap();
        b.add_file("/usr/bin/ls", b"ls", 0o755).unwrap();
        b.add_file("/usr/lib/libc.so", b"libc", 0o644).unwrap();
    });
    let new = snapshot(|b| {
        b.add_directory("/usr", 0o700).unwrap();
        b.add_file("/usr/bin/ls", b"ls", 0o755).unwrap();
        b.add_file("/usr/lib/libc.so", b"libc", 0o644).unwrap();
    });

    let usr = CatalogPath::parse("/usr").unwrap();
    assert_eq!(old.entry_hash(&usr).unwrap(), new.entry_hash(&usr).unwrap());

    let old_store = CountingStore::wrap(Arc::new(old));
    let new_store = CountingStore::wrap(Arc::new(new));
    let mut events = Vec::new();
    let stats = TreeDiffer::new(old_store.clone(), new_store.clone())
        .compute(&mut events)
        .unwrap();

    assert_eq!(summary(&events), vec!["modify /usr"]);
    assert_eq!(old_store.listed(), vec!["/"]);
    assert_eq!(new_store.listed(), vec!["/"]);
    assert_eq!(stats.pruned, 1);
}

#[test]
fn test_xattr_only_change_is_not_reported() {
    let old = snapshot(|b| {
        b.add_entry(
            "/f",
            DirectoryEntry::file("f", 1, [7u8; 32], 0o644),
            XattrList::new().with("user.tag", "a"),
        )
        .unwrap();
    });
    let new = snapshot(|b| {
        b.add_entry(
            "/f",
            DirectoryEntry::file("f", 1, [7u8; 32], 0o644),
            XattrList::new().with("user.tag", "b"),
        )
        .unwrap();
    });

    // The roots differ, but the entry itself compares equal structurally
    assert_ne!(old.root_hash(), new.root_hash());
    let events = TreeDiffer::new(Arc::new(old), Arc::new(new))
        .collect()
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_repository_resolves_roots() {
    let repository = SnapshotRepository::new();
    let old_root = repository.insert(snapshot(|b| {
        b.add_file("/a", b"1", 0o644).unwrap();
    }));
    let new_root = repository.insert(snapshot(|b| {
        b.add_file("/b", b"2", 0o644).unwrap();
    }));
    assert_eq!(repository.len(), 2);

    let events = TreeDiffer::open(&repository, &old_root, &new_root)
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(summary(&events), vec!["remove /a", "add /b"]);

    let missing = [0u8; 32];
    assert!(matches!(
        TreeDiffer::open(&repository, &old_root, &missing),
        Err(FetchError::RootNotFound(_))
    ));
}

#[test]
fn test_channel_sink_feeds_another_thread() {
    let old: SharedStore = Arc::new(snapshot(|b| {
        b.add_file("/a", b"1", 0o644).unwrap();
    }));
    let new: SharedStore = Arc::new(snapshot(|b| {
        b.add_file("/a", b"1", 0o644).unwrap();
        b.add_file("/b/c", b"2", 0o644).unwrap();
    }));

    let (mut tx, rx) = mpsc::channel::<DiffEvent>();
    let consumer = thread::spawn(move || rx.iter().map(|e| e.path().to_string()).collect::<Vec<_>>());

    let stats = TreeDiffer::new(old, new).compute(&mut tx).unwrap();
    drop(tx);

    assert_eq!(consumer.join().unwrap(), vec!["/b", "/b/c"]);
    assert_eq!(stats.added, 2);
}

#[test]
fn test_sink_error_stops_the_walk() {
    let old: SharedStore = Arc::new(snapshot(|_| {}));
    let new: SharedStore = Arc::new(snapshot(|b| {
        for name in ["a", "b", "c", "d"] {
            b.add_file(&format!("/{}", name), name.as_bytes(), 0o644).unwrap();
        }
    }));

    let mut seen = 0;
    let mut sink = FnSink(|_event: DiffEvent| {
        seen += 1;
        if seen == 2 {
            Err(DiffError::Sink("enough".to_string()))
        } else {
            Ok(())
        }
    });
    let result = TreeDiffer::new(old, new).compute(&mut sink);
    assert!(matches!(result, Err(DiffError::Sink(_))));
    drop(sink);
    assert_eq!(seen, 2);
}

#[test]
fn test_repository_store_is_shareable() {
    let repository = SnapshotRepository::new();
    let root = repository.insert(snapshot(|b| {
        b.add_file("/a", b"1", 0o644).unwrap();
    }));
    let store = repository.open(&root).unwrap();
    let handle = thread::spawn(move || store.list_children(&CatalogPath::root()).unwrap().len());
    assert_eq!(handle.join().unwrap(), 1);
}
