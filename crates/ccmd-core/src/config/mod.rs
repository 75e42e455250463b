//! Project manifest model (`<project>/ccmd.yaml`).
//!
//! The project manifest declares intent: which command repositories the
//! project wants, optionally pinned to a ref. It says nothing about what is
//! installed; that is the lock file's job.

mod store;

pub use store::ConfigStore;

use serde::{Deserialize, Serialize};

use crate::serde_helpers::null_as_default;

/// The project manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entry: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commands: Vec<CommandSpec>,
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Repository in key form (`github.com/acme/tool`) or any form the
    /// resolver accepts.
    #[serde(alias = "repository")]
    pub repo: String,
    /// Pinned tag, branch or commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CommandSpec {
    pub fn new(repo: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            repo: repo.into(),
            version: version.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_project_manifest() {
        let config: ProjectConfig = serde_yaml::from_str(
            r#"
name: demo
version: 0.1.0
description: Demo project
author: Someone
commands:
  - repo: github.com/acme/tool
    version: v1.2.0
  - repository: github.com/acme/other
"#,
        )
        .unwrap();

        assert_eq!(config.name, "demo");
        assert_eq!(
            config.commands,
            vec![
                CommandSpec::new("github.com/acme/tool", Some("v1.2.0")),
                CommandSpec::new("github.com/acme/other", None),
            ]
        );
    }

    #[test]
    fn test_minimal_manifest_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("commands: ~\n").unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_unpinned_entries_omit_version() {
        let yaml = serde_yaml::to_string(&CommandSpec::new("github.com/acme/tool", None)).unwrap();
        assert_eq!(yaml, "repo: github.com/acme/tool\n");
    }
}
