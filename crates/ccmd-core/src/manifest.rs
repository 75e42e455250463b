//! Package manifest (`<package>/ccmd.yaml`).
//!
//! # Example YAML
//!
//! ```yaml
//! name: tool
//! version: 1.2.0
//! description: Summarise the current branch
//! author: Acme Tools
//! repository: https://github.com/acme/tool
//! entry: index.md
//! tags: [git, review]
//! license: MIT
//! dependencies:
//!   - github.com/acme/helper
//! ```

use serde::{Deserialize, Serialize};

use crate::layout::DEFAULT_ENTRY;
use crate::serde_helpers::null_as_default;

/// Descriptor shipped inside every command package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    /// Semantic version without a leading `v`.
    pub version: String,
    pub description: String,
    pub author: String,
    pub repository: String,
    /// Entry document relative to the package root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Other command repositories this package expects; recorded, not installed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl PackageManifest {
    /// Fields that must be present and non-empty.
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["name", "version", "description", "author", "repository"];

    /// The entry document path, defaulting to `index.md`.
    pub fn entry_path(&self) -> &str {
        match self.entry.as_deref() {
            Some(entry) if !entry.is_empty() => entry,
            _ => DEFAULT_ENTRY,
        }
    }
}

/// Lenient parse target: every field optional, so absent fields can be
/// reported by name instead of as a generic parse failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    entry: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    dependencies: Vec<String>,
}

impl RawManifest {
    /// Convert into a [`PackageManifest`], or list the missing required fields.
    pub(crate) fn into_manifest(self) -> Result<PackageManifest, Vec<&'static str>> {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        let fields = [
            &self.name,
            &self.version,
            &self.description,
            &self.author,
            &self.repository,
        ];
        let missing: Vec<&'static str> = PackageManifest::REQUIRED_FIELDS
            .iter()
            .zip(fields)
            .filter(|(_, value)| !present(value))
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(PackageManifest {
            name: self.name.unwrap_or_default(),
            version: self.version.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            repository: self.repository.unwrap_or_default(),
            entry: self.entry,
            tags: self.tags,
            license: self.license,
            homepage: self.homepage,
            dependencies: self.dependencies,
        })
    }
}
