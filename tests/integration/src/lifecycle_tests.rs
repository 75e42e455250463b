//! End-to-end lifecycle over the real filesystem and real git repositories
//!
//! Exercises declare -> sync -> re-pin -> undeclare -> check with `OsFs`
//! and `GitFetcher` against bare repositories published under a temp dir.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ccmd_core::{
    AssumeNo, AssumeYes, CheckStatus, ConfigStore, Error, InstallRequest, Installer, LockStore,
    ProjectLayout, Reconciler, SpecResolver, SyncOptions, ValidationKind,
};
use ccmd_fs::io::backup_path;
use ccmd_fs::{FileSystem, OsFs};
use ccmd_git::GitFetcher;
use ccmd_test_utils::git::PackageRepo;
use ccmd_test_utils::{PackageFixture, TestProject};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Stores {
    layout: ProjectLayout,
    installer: Installer,
    lock: LockStore,
    config: ConfigStore,
}

/// Open the stores for the project at `root`, as the CLI does.
fn open(root: &Path) -> Stores {
    let fs: Arc<dyn FileSystem> = Arc::new(OsFs::new());
    let layout = ProjectLayout::new(root);
    let installer = Installer::new(fs.clone(), Arc::new(GitFetcher::new()), layout.clone());
    let lock = LockStore::new(fs.clone(), layout.lock_path());
    lock.load().unwrap();
    let config = ConfigStore::new(fs, layout.manifest_path(), SpecResolver::new());
    if config.exists() {
        config.load().unwrap();
    }
    Stores {
        layout,
        installer,
        lock,
        config,
    }
}

/// `acme/tool` with releases v1.0.0 and v2.0.0.
fn release_repo(root: &Path) -> PackageRepo {
    let repo = PackageRepo::create(root, "acme", "tool");
    repo.commit(&PackageFixture::new("tool", "1.0.0"), Some("v1.0.0"));
    repo.commit(
        &PackageFixture::new("tool", "2.0.0").with_body("# tool\n\nSecond release.\n"),
        Some("v2.0.0"),
    );
    repo.publish();
    repo
}

fn install_root_is_empty(layout: &ProjectLayout) -> bool {
    fs::read_dir(layout.install_dir())
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

#[test]
fn test_declare_sync_repin_undeclare() {
    let repos = TempDir::new().unwrap();
    let url = release_repo(repos.path()).url();
    let project = TestProject::new();
    project.write_config(&[(url.as_str(), Some("v1.0.0"))]);
    let stores = open(project.root());
    let reconciler = Reconciler::new(&stores.installer, &stores.lock, &stores.config);

    // Declare -> sync installs the pinned release.
    let report = reconciler.sync(SyncOptions::default(), &AssumeNo).unwrap();
    assert_eq!(report.installed, vec!["tool"]);

    let first = stores.lock.get_command("tool").unwrap().unwrap();
    assert_eq!(first.version, "v1.0.0");
    assert_eq!(first.source, url);
    let commit = first.commit.clone().expect("git reports a commit");
    assert_eq!(commit.len(), 40);
    assert_eq!(first.resolved, format!("{url}#{commit}"));
    project.assert_file_contains(".claude/commands/tool/ccmd.yaml", "version: \"1.0.0\"");
    project.assert_file_not_exists(".claude/commands/tool/.git");
    assert_eq!(reconciler.check().unwrap().status, CheckStatus::Healthy);

    // Re-pin: the outdated lock entry is replaced without force.
    project.write_config(&[(url.as_str(), Some("v2.0.0"))]);
    stores.config.load().unwrap();
    let report = stores
        .installer
        .install_from_config(&stores.lock, &stores.config, false)
        .unwrap();
    assert_eq!(report.succeeded, vec!["tool"]);

    let second = stores.lock.get_command("tool").unwrap().unwrap();
    assert_eq!(second.version, "v2.0.0");
    assert_ne!(second.commit, first.commit);
    project.assert_file_contains(".claude/commands/tool/ccmd.yaml", "version: \"2.0.0\"");
    project.assert_file_contains(".claude/commands/tool.md", "Second release.");

    // Undeclare -> sync removes it.
    project.write_config(&[]);
    stores.config.load().unwrap();
    let report = reconciler.sync(SyncOptions::default(), &AssumeYes).unwrap();
    assert_eq!(report.removed, vec!["tool"]);
    assert!(install_root_is_empty(&stores.layout));
    assert!(stores.lock.names().unwrap().is_empty());
    assert!(reconciler.check().unwrap().is_healthy());
}

#[test]
fn test_lock_file_persists_across_invocations_with_backup() {
    let repos = TempDir::new().unwrap();
    let url = release_repo(repos.path()).url();
    let project = TestProject::new();

    {
        let stores = open(project.root());
        stores
            .installer
            .install(&stores.lock, &stores.config, &InstallRequest::new(format!("{url}@v1.0.0")))
            .unwrap();
        stores
            .installer
            .install(
                &stores.lock,
                &stores.config,
                &InstallRequest::new(&url).with_version("v2.0.0").force(true),
            )
            .unwrap();
    }

    let stores = open(project.root());
    let entry = stores.lock.get_command("tool").unwrap().unwrap();
    assert_eq!(entry.version, "v2.0.0");

    let backup = fs::read_to_string(backup_path(&stores.layout.lock_path())).unwrap();
    assert!(backup.contains("v1.0.0"), "backup holds the previous save:\n{backup}");
    assert!(!backup.contains("v2.0.0"));
}

#[test]
fn test_invalid_package_leaves_install_root_clean() {
    let repos = TempDir::new().unwrap();
    let repo = PackageRepo::create(repos.path(), "acme", "broken");
    repo.commit(
        &PackageFixture::new("broken", "1.0.0").without_entry(),
        None,
    );
    let url = repo.publish();
    let project = TestProject::new();
    let stores = open(project.root());

    let err = stores
        .installer
        .install(&stores.lock, &stores.config, &InstallRequest::new(&url))
        .unwrap_err();

    assert!(
        matches!(err, Error::Validation(ref e) if e.kind == ValidationKind::EntryMissing),
        "got: {err}"
    );
    assert!(install_root_is_empty(&stores.layout));
    project.assert_file_not_exists("ccmd-lock.yaml");
}

#[test]
fn test_check_detects_local_edits() {
    let repos = TempDir::new().unwrap();
    let url = release_repo(repos.path()).url();
    let project = TestProject::new();
    let stores = open(project.root());
    stores
        .installer
        .install(&stores.lock, &stores.config, &InstallRequest::new(&url))
        .unwrap();

    fs::write(
        project.path(".claude/commands/tool/index.md"),
        "# tool\n\nEdited by hand.\n",
    )
    .unwrap();

    let report = Reconciler::new(&stores.installer, &stores.lock, &stores.config)
        .check()
        .unwrap();
    assert_eq!(report.status, CheckStatus::Drifted);
    assert_eq!(report.drifted[0].name, "tool");
}
