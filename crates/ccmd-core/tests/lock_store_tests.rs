//! LockStore persistence, atomicity and concurrency tests

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use ccmd_core::lock::FORMAT_VERSION;
use ccmd_core::{Error, LockEntry, LockStore};
use ccmd_fs::io::{backup_path, temp_path};
use ccmd_fs::{FaultOp, FileSystem, MemoryFs};
use pretty_assertions::assert_eq;

const LOCK_PATH: &str = "/project/ccmd-lock.yaml";

fn memory_store() -> (Arc<MemoryFs>, LockStore) {
    let fs = Arc::new(MemoryFs::new());
    fs.create_dir_all(Path::new("/project")).unwrap();
    let store = LockStore::new(fs.clone(), LOCK_PATH);
    (fs, store)
}

fn entry(name: &str, version: &str) -> LockEntry {
    let source = format!("https://github.com/acme/{name}.git");
    let mut entry = LockEntry::new(name, version, source.clone());
    entry.resolved = format!("{source}#0123abcd");
    entry.commit = Some("0123abcd".into());
    entry.dependencies = vec!["github.com/acme/helper".into()];
    entry.metadata = BTreeMap::from([
        ("author".to_string(), "Acme".to_string()),
        ("checksum".to_string(), "sha256:00".to_string()),
    ]);
    entry
}

#[test]
fn test_missing_file_loads_empty_store() {
    let (fs, store) = memory_store();
    store.load().unwrap();

    assert!(store.list_commands().unwrap().is_empty());
    assert_eq!(store.snapshot().unwrap().version, FORMAT_VERSION);
    assert!(!fs.exists(Path::new(LOCK_PATH)), "load must not create the file");
}

#[test]
fn test_operations_require_load() {
    let (_fs, store) = memory_store();

    assert!(matches!(store.save(), Err(Error::NotLoaded { .. })));
    assert!(matches!(
        store.add_command(entry("tool", "1.0.0")),
        Err(Error::NotLoaded { .. })
    ));
    assert!(matches!(store.list_commands(), Err(Error::NotLoaded { .. })));
}

#[test]
fn test_save_then_load_round_trips() {
    let (fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "v1.2.0")).unwrap();
    store.add_command(entry("review", "2.0.0")).unwrap();
    store.save().unwrap();

    let reloaded = LockStore::new(fs, LOCK_PATH);
    reloaded.load().unwrap();

    assert_eq!(reloaded.snapshot().unwrap(), store.snapshot().unwrap());
    assert_eq!(reloaded.names().unwrap(), vec!["review", "tool"]);
}

#[test]
fn test_saved_file_is_readable_yaml() {
    let (fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "v1.2.0")).unwrap();
    store.save().unwrap();

    let text = fs.read_to_string(Path::new(LOCK_PATH)).unwrap();
    assert!(text.starts_with("version: '1.0'") || text.starts_with("version: \"1.0\""));
    assert!(text.contains("commands:"));
    assert!(text.contains("  tool:"));
    assert!(text.contains("installed_at:"));
    assert!(text.contains("0123abcd"));
}

#[test]
fn test_rename_failure_leaves_lock_file_byte_identical() {
    let (fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "1.0.0")).unwrap();
    store.save().unwrap();
    let before = fs.read(Path::new(LOCK_PATH)).unwrap();

    store.add_command(entry("review", "1.0.0")).unwrap();
    fs.fail(FaultOp::Rename, LOCK_PATH);
    let result = store.save();

    assert!(matches!(result, Err(Error::Fs(_))), "got: {result:?}");
    assert_eq!(fs.read(Path::new(LOCK_PATH)).unwrap(), before);
    assert!(!fs.exists(&temp_path(Path::new(LOCK_PATH))));
}

#[test]
fn test_backup_holds_previous_save() {
    let (fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "1.0.0")).unwrap();
    store.save().unwrap();
    let first = fs.read(Path::new(LOCK_PATH)).unwrap();

    store.add_command(entry("review", "1.0.0")).unwrap();
    store.save().unwrap();

    let backup = fs.read(&backup_path(Path::new(LOCK_PATH))).unwrap();
    assert_eq!(backup, first);
    assert_ne!(fs.read(Path::new(LOCK_PATH)).unwrap(), first);
}

#[test]
fn test_backup_failure_does_not_block_save() {
    let (fs, store) = memory_store();
    store.load().unwrap();
    store.save().unwrap();

    fs.fail(FaultOp::Write, backup_path(Path::new(LOCK_PATH)));
    store.add_command(entry("tool", "1.0.0")).unwrap();
    store.save().unwrap();

    let reloaded = LockStore::new(fs, LOCK_PATH);
    reloaded.load().unwrap();
    assert!(reloaded.has_command("tool").unwrap());
}

#[test]
fn test_corrupt_file_is_a_hard_error_and_left_alone() {
    let (fs, store) = memory_store();
    let garbage = b"version: \"1.0\"\ncommands: [unclosed\n";
    fs.write(Path::new(LOCK_PATH), garbage).unwrap();

    let err = store.load().unwrap_err();

    assert!(matches!(err, Error::LockCorrupt { .. }), "got: {err}");
    assert!(!store.is_loaded());
    assert_eq!(fs.read(Path::new(LOCK_PATH)).unwrap(), garbage);
}

#[test]
fn test_entry_under_wrong_key_is_corrupt() {
    let (fs, store) = memory_store();
    let text = r#"
version: "1.0"
commands:
  tool:
    name: other
    version: 1.0.0
    source: https://github.com/acme/other.git
    installed_at: 2026-01-01T00:00:00Z
    updated_at: 2026-01-01T00:00:00Z
"#;
    fs.write(Path::new(LOCK_PATH), text.as_bytes()).unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, Error::LockCorrupt { ref message, .. } if message.contains("other")));
}

#[test]
fn test_entry_with_empty_source_is_corrupt() {
    let (fs, store) = memory_store();
    let text = r#"
version: "1.0"
commands:
  tool:
    name: tool
    version: 1.0.0
    source: ""
    installed_at: 2026-01-01T00:00:00Z
    updated_at: 2026-01-01T00:00:00Z
"#;
    fs.write(Path::new(LOCK_PATH), text.as_bytes()).unwrap();

    assert!(matches!(store.load(), Err(Error::LockCorrupt { .. })));
}

#[test]
fn test_unsupported_major_version_is_rejected() {
    let (fs, store) = memory_store();
    fs.write(Path::new(LOCK_PATH), b"version: \"2.0\"\ncommands: {}\n")
        .unwrap();

    let err = store.load().unwrap_err();
    assert!(
        matches!(err, Error::UnsupportedLockVersion { ref version, .. } if version == "2.0"),
        "got: {err}"
    );
}

#[test]
fn test_unquoted_version_and_null_commands_load() {
    let (fs, store) = memory_store();
    fs.write(Path::new(LOCK_PATH), b"version: 1.0\ncommands:\n")
        .unwrap();

    store.load().unwrap();
    assert!(store.list_commands().unwrap().is_empty());
    assert_eq!(store.snapshot().unwrap().version, FORMAT_VERSION);
}

#[test]
fn test_add_command_validates_and_stamps() {
    let (_fs, store) = memory_store();
    store.load().unwrap();

    let err = store.add_command(LockEntry::new("", "1.0.0", "https://x/y.git"));
    assert!(matches!(err, Err(Error::InvalidInput { .. })));
    let err = store.add_command(LockEntry::new("tool", "1.0.0", ""));
    assert!(matches!(err, Err(Error::InvalidInput { .. })));

    store.add_command(entry("tool", "1.0.0")).unwrap();
    let stored = store.get_command("tool").unwrap().unwrap();
    assert_eq!(stored.installed_at, stored.updated_at);

    // Last writer wins
    store.add_command(entry("tool", "2.0.0")).unwrap();
    assert_eq!(store.get_command("tool").unwrap().unwrap().version, "2.0.0");
    assert_eq!(store.list_commands().unwrap().len(), 1);
}

#[test]
fn test_replace_command_keeps_installed_at() {
    let (_fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "1.0.0")).unwrap();
    let original = store.get_command("tool").unwrap().unwrap();

    let mut copy = original.clone();
    copy.version = "1.1.0".into();
    copy.installed_at = copy.installed_at - chrono::Duration::days(30);
    store.replace_command("tool", copy).unwrap();

    let replaced = store.get_command("tool").unwrap().unwrap();
    assert_eq!(replaced.version, "1.1.0");
    assert_eq!(replaced.installed_at, original.installed_at);
    assert!(replaced.updated_at >= original.updated_at);
}

#[test]
fn test_replace_command_rejects_absent_and_renamed() {
    let (_fs, store) = memory_store();
    store.load().unwrap();

    let err = store.replace_command("tool", entry("tool", "1.0.0")).unwrap_err();
    assert!(err.is_not_found());

    store.add_command(entry("tool", "1.0.0")).unwrap();
    let err = store.replace_command("tool", entry("other", "1.0.0")).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
}

#[test]
fn test_update_command_applies_mutator_to_copy() {
    let (_fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "1.0.0")).unwrap();

    store
        .update_command("tool", |e| {
            e.metadata.insert("note".into(), "pinned".into());
        })
        .unwrap();
    assert_eq!(
        store.get_command("tool").unwrap().unwrap().metadata.get("note"),
        Some(&"pinned".to_string())
    );

    // A mutation that breaks an invariant is rejected and not applied.
    let err = store
        .update_command("tool", |e| e.version.clear())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
    assert_eq!(store.get_command("tool").unwrap().unwrap().version, "1.0.0");

    assert!(store.update_command("missing", |_| {}).unwrap_err().is_not_found());
}

#[test]
fn test_remove_command() {
    let (_fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "1.0.0")).unwrap();

    let removed = store.remove_command("tool").unwrap();
    assert_eq!(removed.name, "tool");
    assert!(!store.has_command("tool").unwrap());
    assert!(store.remove_command("tool").unwrap_err().is_not_found());
}

#[test]
fn test_reads_return_copies() {
    let (_fs, store) = memory_store();
    store.load().unwrap();
    store.add_command(entry("tool", "1.0.0")).unwrap();

    let mut copy = store.get_command("tool").unwrap().unwrap();
    copy.version = "9.9.9".into();
    let mut listed = store.list_commands().unwrap();
    listed[0].source.clear();

    let stored = store.get_command("tool").unwrap().unwrap();
    assert_eq!(stored.version, "1.0.0");
    assert!(!stored.source.is_empty());
}

#[test]
fn test_concurrent_adds_and_saves_serialize() {
    let (fs, store) = memory_store();
    store.load().unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.add_command(entry(&format!("cmd{i}"), "1.0.0")).unwrap();
                // Readers never see a half-applied entry.
                for listed in store.list_commands().unwrap() {
                    assert!(!listed.name.is_empty());
                    assert!(!listed.source.is_empty());
                }
                store.save().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.list_commands().unwrap().len(), 8);

    let reloaded = LockStore::new(fs, LOCK_PATH);
    reloaded.load().unwrap();
    assert_eq!(reloaded.list_commands().unwrap().len(), 8);
}
