//! Document loading and saving for ccmd's on-disk files.
//!
//! All persisted documents (lock file, project manifest, package manifest)
//! are YAML; the format is checked from the file extension so a mistyped
//! path fails loudly instead of being parsed as the wrong format.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "yaml" | "yml" => Ok(()),
        _ => Err(Error::UnsupportedFormat { extension }),
    }
}

/// Parse a YAML document that was read from `path`.
pub fn decode<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    check_extension(path)?;
    serde_yaml::from_str(content).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        format: "YAML".into(),
        message: e.to_string(),
    })
}

/// Serialize a document destined for `path`.
pub fn encode<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    check_extension(path)?;
    serde_yaml::to_string(value).map_err(|e| Error::Serialize {
        path: path.to_path_buf(),
        format: "YAML".into(),
        message: e.to_string(),
    })
}
