//! On-disk layout of a ccmd project

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Project manifest and package manifest file name.
pub const MANIFEST_FILENAME: &str = "ccmd.yaml";

/// Lock file name at the project root.
pub const LOCK_FILENAME: &str = "ccmd-lock.yaml";

/// Install root relative to the project root.
pub const DEFAULT_INSTALL_DIR: &str = ".claude/commands";

/// Entry document used when a package manifest names none.
pub const DEFAULT_ENTRY: &str = "index.md";

/// Prefix of the per-install staging directories under the install root.
pub const STAGING_PREFIX: &str = ".ccmd-staging-";

/// Where a project's manifest, lock file and installed packages live.
///
/// Every installed package `<name>` has two halves: the directory
/// `<install-dir>/<name>/` and the companion document `<install-dir>/<name>.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    install_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let install_dir = root.join(DEFAULT_INSTALL_DIR);
        Self { root, install_dir }
    }

    /// Override the install root. Relative paths are taken from the project root.
    pub fn with_install_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.install_dir = self.root.join(dir);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILENAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.install_dir.join(name)
    }

    pub fn package_manifest_path(&self, name: &str) -> PathBuf {
        self.package_dir(name).join(MANIFEST_FILENAME)
    }

    pub fn companion_path(&self, name: &str) -> PathBuf {
        self.install_dir.join(format!("{name}.md"))
    }

    /// A fresh, unique staging directory path (not created).
    pub fn new_staging_area(&self) -> PathBuf {
        self.install_dir
            .join(format!("{STAGING_PREFIX}{}", Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let layout = ProjectLayout::new("/work/project");
        assert_eq!(layout.manifest_path(), PathBuf::from("/work/project/ccmd.yaml"));
        assert_eq!(layout.lock_path(), PathBuf::from("/work/project/ccmd-lock.yaml"));
        assert_eq!(
            layout.package_manifest_path("tool"),
            PathBuf::from("/work/project/.claude/commands/tool/ccmd.yaml")
        );
        assert_eq!(
            layout.companion_path("tool"),
            PathBuf::from("/work/project/.claude/commands/tool.md")
        );
    }

    #[test]
    fn test_install_dir_override() {
        let relative = ProjectLayout::new("/p").with_install_dir("cmds");
        assert_eq!(relative.package_dir("x"), PathBuf::from("/p/cmds/x"));

        let absolute = ProjectLayout::new("/p").with_install_dir("/elsewhere");
        assert_eq!(absolute.package_dir("x"), PathBuf::from("/elsewhere/x"));
    }

    #[test]
    fn test_staging_areas_are_unique_and_hidden() {
        let layout = ProjectLayout::new("/p");
        let a = layout.new_staging_area();
        let b = layout.new_staging_area();
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(layout.install_dir()));
        assert!(a.file_name().unwrap().to_string_lossy().starts_with(STAGING_PREFIX));
    }
}
