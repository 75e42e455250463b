//! Command package fixtures.

use std::io;
use std::path::Path;

use ccmd_fs::FileSystem;

/// Describes a command package to write into a directory.
///
/// By default the fixture is structurally valid: a complete `ccmd.yaml` and a
/// non-empty `index.md`. The builder methods break it in specific ways.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub repository: String,
    /// Entry document path; `None` leaves the manifest field out (defaults to `index.md`).
    pub entry: Option<String>,
    pub entry_body: String,
    pub dependencies: Vec<String>,
    pub files: Vec<(String, String)>,
    pub raw_manifest: Option<String>,
    pub omit_manifest: bool,
    pub omit_entry: bool,
}

impl PackageFixture {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: format!("The {name} command"),
            author: "Test Author".to_string(),
            repository: format!("https://github.com/acme/{name}"),
            entry: None,
            entry_body: format!("# {name}\n\nRun the {name} command.\n"),
            dependencies: Vec::new(),
            files: Vec::new(),
            raw_manifest: None,
            omit_manifest: false,
            omit_entry: false,
        }
    }

    pub fn with_entry(mut self, entry: &str, body: &str) -> Self {
        self.entry = Some(entry.to_string());
        self.entry_body = body.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.entry_body = body.to_string();
        self
    }

    pub fn with_dependency(mut self, dependency: &str) -> Self {
        self.dependencies.push(dependency.to_string());
        self
    }

    pub fn with_file(mut self, relative: &str, content: &str) -> Self {
        self.files.push((relative.to_string(), content.to_string()));
        self
    }

    /// Replace the generated manifest with `text` verbatim.
    pub fn with_raw_manifest(mut self, text: &str) -> Self {
        self.raw_manifest = Some(text.to_string());
        self
    }

    pub fn without_manifest(mut self) -> Self {
        self.omit_manifest = true;
        self
    }

    pub fn without_entry(mut self) -> Self {
        self.omit_entry = true;
        self
    }

    /// Path of the entry document relative to the package root.
    pub fn entry_path(&self) -> &str {
        self.entry.as_deref().unwrap_or("index.md")
    }

    /// The `ccmd.yaml` text this fixture writes.
    pub fn manifest_yaml(&self) -> String {
        if let Some(raw) = &self.raw_manifest {
            return raw.clone();
        }
        let mut text = format!(
            "name: \"{}\"\nversion: \"{}\"\ndescription: \"{}\"\nauthor: \"{}\"\nrepository: \"{}\"\n",
            self.name, self.version, self.description, self.author, self.repository
        );
        if let Some(entry) = &self.entry {
            text.push_str(&format!("entry: \"{entry}\"\n"));
        }
        text.push_str("tags:\n  - test\n");
        if !self.dependencies.is_empty() {
            text.push_str("dependencies:\n");
            for dependency in &self.dependencies {
                text.push_str(&format!("  - \"{dependency}\"\n"));
            }
        }
        text
    }

    /// Write the package tree into `dir`, creating it if needed.
    pub fn write_to(&self, fs: &dyn FileSystem, dir: &Path) -> io::Result<()> {
        fs.create_dir_all(dir)?;
        if !self.omit_manifest {
            fs.write(&dir.join("ccmd.yaml"), self.manifest_yaml().as_bytes())?;
        }
        if !self.omit_entry {
            write_file(fs, &dir.join(self.entry_path()), &self.entry_body)?;
        }
        for (relative, content) in &self.files {
            write_file(fs, &dir.join(relative), content)?;
        }
        Ok(())
    }
}

fn write_file(fs: &dyn FileSystem, path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write(path, content.as_bytes())
}
