//! Dual-structure checks for installed packages.
//!
//! An installed package is whole only when both its directory and its
//! companion document exist. Either half missing is reported on its own;
//! neither touches the lock file.

use std::fmt;
use std::path::PathBuf;

use ccmd_fs::FileSystem;

use crate::layout::ProjectLayout;
use crate::validation::{StructureValidator, ValidationError};

/// One problem with an installed package's on-disk structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    /// `<install-dir>/<name>/` is absent
    MissingDirectory(PathBuf),
    /// `<install-dir>/<name>.md` is absent
    MissingCompanion(PathBuf),
    /// The directory exists but is not a valid package
    InvalidPackage(ValidationError),
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDirectory(path) => {
                write!(f, "package directory missing: {}", path.display())
            }
            Self::MissingCompanion(path) => {
                write!(f, "companion document missing: {}", path.display())
            }
            Self::InvalidPackage(err) => write!(f, "{err}"),
        }
    }
}

/// Result of [`check_structure`] for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureReport {
    pub name: String,
    pub issues: Vec<StructureIssue>,
}

impl StructureReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_missing(&self) -> bool {
        self.issues.iter().any(|i| {
            matches!(
                i,
                StructureIssue::MissingDirectory(_) | StructureIssue::MissingCompanion(_)
            )
        })
    }
}

/// Check both halves of the installed package `name`.
///
/// The package directory is validated only when it exists.
pub fn check_structure(fs: &dyn FileSystem, layout: &ProjectLayout, name: &str) -> StructureReport {
    let mut issues = Vec::new();

    let dir = layout.package_dir(name);
    if fs.is_dir(&dir) {
        if let Err(err) = StructureValidator::new(fs).validate(&dir) {
            issues.push(StructureIssue::InvalidPackage(err));
        }
    } else {
        issues.push(StructureIssue::MissingDirectory(dir));
    }

    let companion = layout.companion_path(name);
    if !fs.is_file(&companion) {
        issues.push(StructureIssue::MissingCompanion(companion));
    }

    StructureReport {
        name: name.to_string(),
        issues,
    }
}
