//! Shared harness for ccmd-core integration tests.
//!
//! Everything runs against a [`MemoryFs`] rooted at `/project`, with a
//! [`FakeFetcher`] serving package fixtures by URL.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ccmd_core::{ConfigStore, Installer, LockStore, ProjectLayout, SpecResolver};
use ccmd_fs::{FileSystem, MemoryFs};
use ccmd_test_utils::{FakeFetcher, PackageFixture};

pub const ROOT: &str = "/project";

/// Normalized URL for a GitHub `owner/repo`.
pub fn github(owner_repo: &str) -> String {
    format!("https://github.com/{owner_repo}.git")
}

pub struct Harness {
    pub fs: Arc<MemoryFs>,
    pub fetcher: Arc<FakeFetcher>,
    pub layout: ProjectLayout,
    pub installer: Installer,
    pub lock: LockStore,
    pub config: ConfigStore,
}

impl Harness {
    /// Empty project with a loaded, empty lock store and no manifest.
    pub fn new() -> Self {
        let fs = Arc::new(MemoryFs::new());
        fs.create_dir_all(Path::new(ROOT)).unwrap();
        let dyn_fs: Arc<dyn FileSystem> = fs.clone();

        let fetcher = Arc::new(FakeFetcher::new(dyn_fs.clone()));
        let layout = ProjectLayout::new(ROOT);
        let installer = Installer::new(dyn_fs.clone(), fetcher.clone(), layout.clone());
        let lock = LockStore::new(dyn_fs.clone(), layout.lock_path());
        lock.load().unwrap();
        let config = ConfigStore::new(dyn_fs, layout.manifest_path(), SpecResolver::new());

        Self {
            fs,
            fetcher,
            layout,
            installer,
            lock,
            config,
        }
    }

    /// Project whose manifest declares `commands`; the config store is loaded.
    pub fn with_config(commands: &[(&str, Option<&str>)]) -> Self {
        let harness = Self::new();
        harness.write_config(commands);
        harness.config.load().unwrap();
        harness
    }

    pub fn write_config(&self, commands: &[(&str, Option<&str>)]) {
        let mut text = String::from("name: demo\nversion: 0.1.0\ndescription: Demo\nauthor: Tester\ncommands:\n");
        for (repo, version) in commands {
            text.push_str(&format!("  - repo: {repo}\n"));
            if let Some(version) = version {
                text.push_str(&format!("    version: {version}\n"));
            }
        }
        if commands.is_empty() {
            text = text.replace("commands:\n", "commands: []\n");
        }
        self.fs.write(&self.layout.manifest_path(), text.as_bytes()).unwrap();
    }

    /// Publish a valid package named after the repo's last segment.
    pub fn publish(&self, owner_repo: &str, version: &str) -> String {
        let name = owner_repo.rsplit('/').next().unwrap();
        let url = github(owner_repo);
        self.fetcher.publish(&url, PackageFixture::new(name, version));
        url
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        Path::new(ROOT).join(relative)
    }

    pub fn read(&self, path: &Path) -> String {
        self.fs.read_to_string(path).unwrap()
    }

    pub fn read_bytes(&self, path: &Path) -> Option<Vec<u8>> {
        self.fs.read(path).ok()
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    /// Immediate children of the install root.
    pub fn install_root_entries(&self) -> Vec<PathBuf> {
        self.fs
            .read_dir(self.layout.install_dir())
            .unwrap_or_default()
    }
}
