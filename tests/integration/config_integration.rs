//! Integration tests for layered configuration loading

use super::test_utils::ENV_MUTEX;
use snapcat::cli::{Commands, DirtabCommands, OutputFormat, RunContext};
use snapcat::config::{ConfigLoader, WORKSPACE_CONFIG_FILE};
use std::fs;
use tempfile::TempDir;

struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        let saved = vars
            .iter()
            .map(|(k, v)| {
                let old = std::env::var(k).ok();
                std::env::set_var(k, v);
                (*k, old)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

#[test]
fn test_environment_overrides_workspace_file() {
    let _lock = ENV_MUTEX.lock();
    let temp_dir = TempDir::new().unwrap();
    let home = temp_dir.path().join("home");
    fs::create_dir_all(&home).unwrap();
    fs::write(
        temp_dir.path().join(WORKSPACE_CONFIG_FILE),
        "[watch]\ndebounce_ms = 10\n",
    )
    .unwrap();

    let home_str = home.to_string_lossy().to_string();
    let _env = EnvGuard::set(&[
        ("HOME", home_str.as_str()),
        ("SNAPCAT__WATCH__DEBOUNCE_MS", "25"),
    ]);

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.watch.debounce_ms, 25);
}

#[test]
fn test_scan_config_applies_to_commands() {
    let _lock = ENV_MUTEX.lock();
    let temp_dir = TempDir::new().unwrap();
    let home = temp_dir.path().join("home");
    fs::create_dir_all(&home).unwrap();
    let home_str = home.to_string_lossy().to_string();
    let _env = EnvGuard::set(&[("HOME", home_str.as_str())]);

    let tree = temp_dir.path().join("tree");
    fs::create_dir_all(tree.join("build")).unwrap();
    fs::write(tree.join("a.txt"), "a").unwrap();

    let hash = |ctx: &RunContext| {
        ctx.execute(&Commands::Hash { dir: tree.clone() }).unwrap()
    };
    let plain = RunContext::new(temp_dir.path().to_path_buf(), None).unwrap();
    let before = hash(&plain);

    fs::write(tree.join("build").join("out.o"), "obj").unwrap();
    assert_ne!(before, hash(&plain));

    fs::write(
        temp_dir.path().join(WORKSPACE_CONFIG_FILE),
        "[scan]\nignore_names = [\"build\"]\n",
    )
    .unwrap();
    let ignoring = RunContext::new(temp_dir.path().to_path_buf(), None).unwrap();
    assert_eq!(ignoring.config().scan.ignore_names, vec!["build"]);

    fs::remove_dir_all(tree.join("build")).unwrap();
    let without_build = hash(&plain);
    fs::create_dir_all(tree.join("build")).unwrap();
    fs::write(tree.join("build").join("out.o"), "obj").unwrap();
    assert_eq!(without_build, hash(&ignoring));
}

#[test]
fn test_explicit_config_file_is_required() {
    let temp_dir = TempDir::new().unwrap();
    let result = RunContext::new(
        temp_dir.path().to_path_buf(),
        Some(temp_dir.path().join("nope.toml")),
    );
    assert!(result.is_err());
}

#[test]
fn test_dirtab_check_command_output() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("dirtab");
    fs::write(&file, "/usr/bin/*\n!/usr/bin/*\n").unwrap();

    let config = snapcat::config::SnapcatConfig::default();
    let ctx = RunContext::with_config(temp_dir.path().to_path_buf(), config);
    let out = ctx
        .execute(&Commands::Dirtab {
            command: DirtabCommands::Check {
                file,
                format: OutputFormat::Json,
            },
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["valid"], false);
    assert_eq!(value["positive_rule_count"], 1);
    assert_eq!(value["negative_rule_count"], 1);
    assert_eq!(value["contradictions"][0], "/usr/bin/*");
}
