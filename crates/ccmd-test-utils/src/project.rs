//! [`TestProject`] builder for ccmd project scenarios on the real filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary project directory with helpers for setup and assertions.
///
/// # Example
///
/// ```rust,no_run
/// use ccmd_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.write_config(&[("github.com/acme/tool", Some("v1.0.0"))]);
/// project.assert_file_exists("ccmd.yaml");
/// ```
#[derive(Debug)]
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary project directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root path of the project.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the project.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a project `ccmd.yaml` declaring `commands` as `(repo, version)` pairs.
    pub fn write_config(&self, commands: &[(&str, Option<&str>)]) {
        let mut text = String::from(
            "name: \"test-project\"\nversion: \"0.1.0\"\ndescription: \"Test project\"\nauthor: \"Test Author\"\n",
        );
        if commands.is_empty() {
            text.push_str("commands: []\n");
        } else {
            text.push_str("commands:\n");
            for (repo, version) in commands {
                text.push_str(&format!("  - repo: \"{repo}\"\n"));
                if let Some(version) = version {
                    text.push_str(&format!("    version: \"{version}\"\n"));
                }
            }
        }
        fs::write(self.path("ccmd.yaml"), text).unwrap();
    }

    /// Read a file relative to the project root.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let full_path = self.path(relative);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Assert that `path` (relative to the project root) exists.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` contains `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read(path);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            path,
            content,
            file_content
        );
    }
}
