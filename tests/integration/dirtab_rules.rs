//! Integration tests for dirtab rule files

use snapcat::catalog::{CatalogPath, SnapshotBuilder};
use snapcat::dirtab::{Dirtab, Polarity};
use std::fs;
use tempfile::TempDir;

const RULES: &str = "\
# nested catalogs for every package under /usr
/usr/*
/usr/local/*

! /usr/.svn
! /usr/local/.git
! /usr/local/.svn
 ! /usr/local/x86*
";

#[test]
fn test_selection_verdicts() {
    let dirtab = Dirtab::parse(RULES);
    assert!(dirtab.is_valid());
    assert_eq!(dirtab.rule_count(), 6);

    let selected = ["/usr/local", "/usr/bin", "/usr/svn", "/usr/.git", "/usr/local/git"];
    let rejected = [
        "/usr",
        "usr",
        "/usr/.svn",
        "/usr/local/.svn",
        "/usr/local/.git",
        "/usr/local/x86",
        "/usr/local/x86_64",
        "/usr/local/bin/x86",
    ];
    for path in selected {
        assert!(dirtab.is_matching(path), "{} should be selected", path);
    }
    for path in rejected {
        assert!(!dirtab.is_matching(path), "{} should be rejected", path);
    }
}

#[test]
fn test_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join(".cvmfsdirtab");
    fs::write(&file, RULES).unwrap();

    let dirtab = Dirtab::from_file(&file).unwrap();
    assert_eq!(dirtab.positive_rule_count(), 2);
    assert_eq!(dirtab.negative_rule_count(), 4);
    let last = dirtab.rules().last().unwrap();
    assert_eq!(last.polarity, Polarity::Negative);
    assert_eq!(last.pattern.as_str(), "/usr/local/x86*");
    assert_eq!(last.line, 8);

    assert!(Dirtab::from_file(&temp_dir.path().join("missing")).is_err());
}

#[test]
fn test_windows_line_endings() {
    let dirtab = Dirtab::parse("/usr/*\r\n! /usr/.svn\r\n");
    assert!(dirtab.is_valid());
    assert!(dirtab.is_matching("/usr/bin"));
    assert!(!dirtab.is_matching("/usr/.svn"));
}

#[test]
fn test_select_nested_catalog_candidates_from_snapshot() {
    let mut builder = SnapshotBuilder::new();
    builder.add_file("/usr/bin/ls", b"ls", 0o755).unwrap();
    builder.add_file("/usr/local/lib/x.so", b"x", 0o644).unwrap();
    builder.add_directory("/usr/local/x86_64", 0o755).unwrap();
    builder.add_directory("/usr/.svn", 0o755).unwrap();
    builder.add_file("/etc/hosts", b"h", 0o644).unwrap();
    let snapshot = builder.build().unwrap();

    let dirtab = Dirtab::parse(RULES);
    let selected: Vec<String> = snapshot
        .paths()
        .into_iter()
        .filter(|p| dirtab.is_matching(p))
        .map(|p| p.to_string())
        .collect();

    assert_eq!(selected, vec!["/usr/bin", "/usr/local", "/usr/local/lib"]);
    assert!(!dirtab.is_matching(CatalogPath::root()));
}
