//! Lock file model (`ccmd-lock.yaml`).
//!
//! The lock file records what is actually installed. It is keyed by command
//! name and written in a deterministic order so it diffs cleanly under
//! version control.
//!
//! ```yaml
//! version: "1.0"
//! commands:
//!   tool:
//!     name: tool
//!     version: v1.2.0
//!     source: https://github.com/acme/tool.git
//!     resolved: https://github.com/acme/tool.git#3f1c...
//!     commit: 3f1c...
//!     installed_at: 2026-01-04T10:00:00Z
//!     updated_at: 2026-01-04T10:00:00Z
//!     dependencies: []
//!     metadata:
//!       checksum: sha256:...
//! ```

mod store;

pub use store::LockStore;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::null_as_default;

/// Current lock file format version.
pub const FORMAT_VERSION: &str = "1.0";

/// Major format version this build reads and writes.
pub const SUPPORTED_MAJOR: &str = "1";

/// The whole lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    /// Format version for forward compatibility
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commands: BTreeMap<String, LockEntry>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self::new()
    }
}

impl LockFile {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            commands: BTreeMap::new(),
        }
    }
}

/// The installed state of one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub name: String,
    /// Requested ref, or the manifest version when none was requested.
    pub version: String,
    /// Normalized fetch URL.
    pub source: String,
    /// Exact location that was fetched: `<source>#<commit>` when known.
    #[serde(default)]
    pub resolved: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,
}

impl LockEntry {
    /// A new entry stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let now = Utc::now();
        Self {
            name: name.into(),
            version: version.into(),
            resolved: source.clone(),
            source,
            commit: None,
            installed_at: now,
            updated_at: now,
            dependencies: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Entry document checksum recorded at install time.
    pub fn checksum(&self) -> Option<&str> {
        self.metadata.get("checksum").map(String::as_str)
    }

    /// Check the field invariants, returning a description of the first
    /// violation.
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        for (field, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("source", &self.source),
        ] {
            if value.trim().is_empty() {
                return Err(format!("field '{field}' must not be empty"));
            }
        }
        if self.updated_at < self.installed_at {
            return Err(format!(
                "entry '{}' was updated ({}) before it was installed ({})",
                self.name, self.updated_at, self.installed_at
            ));
        }
        Ok(())
    }
}

/// `resolved` value for a fetch of `source`.
pub fn resolved_location(source: &str, reference: Option<&str>, commit: Option<&str>) -> String {
    match (commit, reference) {
        (Some(commit), _) => format!("{source}#{commit}"),
        (None, Some(reference)) => format!("{source}@{reference}"),
        (None, None) => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_location_prefers_commit() {
        let source = "https://github.com/acme/tool.git";
        assert_eq!(
            resolved_location(source, Some("v1"), Some("abc")),
            "https://github.com/acme/tool.git#abc"
        );
        assert_eq!(
            resolved_location(source, Some("v1"), None),
            "https://github.com/acme/tool.git@v1"
        );
        assert_eq!(resolved_location(source, None, None), source);
    }

    #[test]
    fn test_entry_check() {
        let entry = LockEntry::new("tool", "1.0.0", "https://x/acme/tool.git");
        assert!(entry.check().is_ok());
        assert_eq!(entry.installed_at, entry.updated_at);

        let mut bad = entry.clone();
        bad.version = " ".into();
        assert!(bad.check().unwrap_err().contains("version"));

        let mut backwards = entry;
        backwards.updated_at = backwards.installed_at - chrono::Duration::seconds(1);
        assert!(backwards.check().is_err());
    }

    #[test]
    fn test_null_commands_load_as_empty() {
        let file: LockFile = serde_yaml::from_str("version: \"1.0\"\ncommands: ~\n").unwrap();
        assert!(file.commands.is_empty());
    }
}
