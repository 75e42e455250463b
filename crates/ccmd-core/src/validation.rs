//! Structural validation of command packages.
//!
//! [`StructureValidator::validate`] is a pure function of a path and the
//! filesystem: it never modifies anything, and every failure carries a
//! [`ValidationKind`] so callers can tell transient read failures from
//! packages that will never install.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use ccmd_fs::path::is_contained;
use ccmd_fs::{FileSystem, codec, lexical_normalize};

use crate::layout::MANIFEST_FILENAME;
use crate::manifest::{PackageManifest, RawManifest};
use crate::{Error, Result};

/// What a package failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    PathNotFound,
    NotADirectory,
    ManifestMissing,
    ManifestUnreadable,
    ManifestMalformed,
    MissingField,
    EntryMissing,
    EntryUnreadable,
    EntryNotFile,
    EntryEmpty,
    InvalidEntryPath,
    NameMismatch,
    VersionMismatch,
    InvalidVersion,
}

impl ValidationKind {
    /// Whether retrying the same package could succeed.
    ///
    /// Only read failures are transient; everything else is a property of the
    /// package content.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ManifestUnreadable | Self::EntryUnreadable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PathNotFound => "path not found",
            Self::NotADirectory => "not a directory",
            Self::ManifestMissing => "manifest missing",
            Self::ManifestUnreadable => "manifest unreadable",
            Self::ManifestMalformed => "manifest malformed",
            Self::MissingField => "missing field",
            Self::EntryMissing => "entry document missing",
            Self::EntryUnreadable => "entry document unreadable",
            Self::EntryNotFile => "entry document is not a file",
            Self::EntryEmpty => "entry document empty",
            Self::InvalidEntryPath => "invalid entry path",
            Self::NameMismatch => "name mismatch",
            Self::VersionMismatch => "version mismatch",
            Self::InvalidVersion => "invalid version",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled structural validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid package at {path}: {kind}: {detail}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub path: std::path::PathBuf,
    pub detail: String,
}

impl ValidationError {
    fn new(kind: ValidationKind, path: &Path, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}

/// Confirms a directory is an installable command package.
#[derive(Debug, Clone, Copy)]
pub struct StructureValidator<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> StructureValidator<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Validate the package at `path` and return its manifest.
    ///
    /// Checks run in order and stop at the first failure: directory,
    /// manifest, entry document, name against the directory, versioned
    /// directory suffix against the manifest, semantic version.
    pub fn validate(&self, path: &Path) -> std::result::Result<PackageManifest, ValidationError> {
        use ValidationKind::*;

        let path = lexical_normalize(path);
        let path = path.as_path();

        match self.fs.metadata(path) {
            Ok(stat) if stat.is_dir() => {}
            Ok(_) => return Err(ValidationError::new(NotADirectory, path, "expected a directory")),
            Err(e) => return Err(ValidationError::new(PathNotFound, path, e.to_string())),
        }

        let manifest = self.read_manifest(path)?;
        self.check_entry(path, &manifest)?;

        let dir_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (base, suffix) = match dir_name.split_once('@') {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (dir_name.as_str(), None),
        };

        if manifest.name != base {
            return Err(ValidationError::new(
                NameMismatch,
                path,
                format!(
                    "manifest name '{}' does not match directory '{base}'",
                    manifest.name
                ),
            ));
        }

        if let Some(suffix) = suffix
            && suffix != manifest.version
        {
            return Err(ValidationError::new(
                VersionMismatch,
                path,
                format!(
                    "directory version '{suffix}' does not match manifest version '{}'",
                    manifest.version
                ),
            ));
        }

        semver::Version::parse(&manifest.version).map_err(|e| {
            ValidationError::new(
                InvalidVersion,
                path,
                format!("'{}' is not a semantic version: {e}", manifest.version),
            )
        })?;

        Ok(manifest)
    }

    fn read_manifest(&self, dir: &Path) -> std::result::Result<PackageManifest, ValidationError> {
        use ValidationKind::*;

        let manifest_path = dir.join(MANIFEST_FILENAME);
        match self.fs.metadata(&manifest_path) {
            Ok(stat) if stat.is_file() => {}
            Ok(_) => {
                return Err(ValidationError::new(
                    ManifestMalformed,
                    dir,
                    format!("{MANIFEST_FILENAME} is not a regular file"),
                ));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ValidationError::new(
                    ManifestMissing,
                    dir,
                    format!("{MANIFEST_FILENAME} not found"),
                ));
            }
            Err(e) => return Err(ValidationError::new(ManifestUnreadable, dir, e.to_string())),
        }

        let text = self
            .fs
            .read_to_string(&manifest_path)
            .map_err(|e| ValidationError::new(ManifestUnreadable, dir, e.to_string()))?;

        let raw: RawManifest = codec::decode(&manifest_path, &text)
            .map_err(|e| ValidationError::new(ManifestMalformed, dir, e.to_string()))?;

        raw.into_manifest().map_err(|missing| {
            ValidationError::new(
                MissingField,
                dir,
                format!("missing required field(s): {}", missing.join(", ")),
            )
        })
    }

    fn check_entry(
        &self,
        dir: &Path,
        manifest: &PackageManifest,
    ) -> std::result::Result<(), ValidationError> {
        use ValidationKind::*;

        let entry = manifest.entry_path();
        if !is_contained(entry) {
            return Err(ValidationError::new(
                InvalidEntryPath,
                dir,
                format!("entry '{entry}' must be a relative path inside the package"),
            ));
        }

        let entry_path = dir.join(entry);
        match self.fs.metadata(&entry_path) {
            Ok(stat) if stat.is_file() => {}
            Ok(_) => {
                return Err(ValidationError::new(
                    EntryNotFile,
                    dir,
                    format!("entry '{entry}' is not a regular file"),
                ));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ValidationError::new(
                    EntryMissing,
                    dir,
                    format!("entry '{entry}' not found"),
                ));
            }
            Err(e) => return Err(ValidationError::new(EntryUnreadable, dir, e.to_string())),
        }

        let content = self
            .fs
            .read(&entry_path)
            .map_err(|e| ValidationError::new(EntryUnreadable, dir, e.to_string()))?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::new(
                EntryEmpty,
                dir,
                format!("entry '{entry}' is empty"),
            ));
        }

        Ok(())
    }
}

/// Check that `name` is safe to use as a single path segment under the
/// install root.
pub fn validate_command_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("command name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(Error::invalid_input(format!(
            "command name '{name}' must not start with '.'"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::invalid_input(format!(
            "command name '{name}' must contain only alphanumeric characters, '-', '_' or '.'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("tool", true)]
    #[case::dashes("my-tool_2", true)]
    #[case::dotted("tool.v2", true)]
    #[case::empty("", false)]
    #[case::hidden(".tool", false)]
    #[case::parent("..", false)]
    #[case::slash("a/b", false)]
    #[case::space("my tool", false)]
    fn test_validate_command_name(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(validate_command_name(name).is_ok(), ok, "name: {name:?}");
    }

    #[test]
    fn test_only_unreadable_kinds_are_retryable() {
        assert!(ValidationKind::ManifestUnreadable.is_retryable());
        assert!(ValidationKind::EntryUnreadable.is_retryable());
        assert!(!ValidationKind::ManifestMalformed.is_retryable());
        assert!(!ValidationKind::InvalidVersion.is_retryable());
        assert!(!ValidationKind::PathNotFound.is_retryable());
    }
}
