//! Real git repositories for end-to-end fetch tests.
//!
//! Repositories are built with the `git` CLI and published as bare clones so
//! they can be fetched through `file://` URLs without any network access.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use ccmd_fs::OsFs;

use crate::package::PackageFixture;

/// Run `git` with `args` inside `dir`.
///
/// # Panics
/// Panics if git cannot be spawned or exits unsuccessfully.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "`git {args:?}` failed in {}:\n{}",
            dir.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Initialises a git repository with a local identity and no signing.
///
/// # Panics
/// Panics if any git operation fails.
pub fn init_repo(path: &Path) {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("init_repo: failed to create {}: {e}", path.display()));
    run_git(path, &["init"]);
    run_git(path, &["config", "user.email", "test@test.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    run_git(path, &["config", "commit.gpgsign", "false"]);
    run_git(path, &["config", "tag.gpgsign", "false"]);
}

/// A package repository with a working copy and a bare published copy.
///
/// ```rust,no_run
/// use ccmd_test_utils::{PackageFixture, git::PackageRepo};
///
/// let root = tempfile::TempDir::new().unwrap();
/// let repo = PackageRepo::create(root.path(), "acme", "tool");
/// repo.commit(&PackageFixture::new("tool", "1.2.0"), Some("v1.2.0"));
/// let url = repo.publish();
/// ```
#[derive(Debug)]
pub struct PackageRepo {
    work: PathBuf,
    bare: PathBuf,
}

impl PackageRepo {
    /// Initialise `<root>/work/<owner>/<name>`; publishing goes to
    /// `<root>/<owner>/<name>.git`.
    pub fn create(root: &Path, owner: &str, name: &str) -> Self {
        let work = root.join("work").join(owner).join(name);
        let bare = root.join(owner).join(format!("{name}.git"));
        init_repo(&work);
        Self { work, bare }
    }

    /// Write `fixture` over the working copy, commit it and optionally tag it.
    pub fn commit(&self, fixture: &PackageFixture, tag: Option<&str>) -> &Self {
        fixture
            .write_to(&OsFs, &self.work)
            .unwrap_or_else(|e| panic!("PackageRepo::commit: failed to write fixture: {e}"));
        run_git(&self.work, &["add", "-A"]);
        let message = format!("Release {}", fixture.version);
        run_git(&self.work, &["commit", "-m", &message]);
        if let Some(tag) = tag {
            run_git(&self.work, &["tag", tag]);
        }
        self
    }

    /// Create (or refresh) the bare clone and return its `file://` URL.
    pub fn publish(&self) -> String {
        if self.bare.exists() {
            fs::remove_dir_all(&self.bare)
                .unwrap_or_else(|e| panic!("PackageRepo::publish: failed to clear bare repo: {e}"));
        }
        if let Some(parent) = self.bare.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("PackageRepo::publish: failed to create {}: {e}", parent.display())
            });
        }
        let work = self.work.to_string_lossy().into_owned();
        let bare = self.bare.to_string_lossy().into_owned();
        run_git(&self.work, &["clone", "--bare", &work, &bare]);
        self.url()
    }

    /// `file://` URL of the bare clone.
    pub fn url(&self) -> String {
        format!("file://{}", self.bare.display())
    }

    /// Filesystem path of the bare clone (without the `file://` scheme).
    pub fn bare_path(&self) -> &Path {
        &self.bare
    }
}
