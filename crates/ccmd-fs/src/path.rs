//! Lexical path normalization

use std::path::{Component, Path, PathBuf};

/// Normalize a path without touching the filesystem.
///
/// Removes `.` segments and resolves `..` against the preceding segment.
/// A `..` that would climb above the root (or above the start of a relative
/// path) is dropped, so the result never escapes its anchor.
pub fn lexical_normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut prefix = PathBuf::new();
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::Prefix(p) => prefix.push(p.as_os_str()),
            Component::RootDir => prefix.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part),
        }
    }

    let mut normalized = prefix;
    for part in parts {
        normalized.push(part);
    }
    normalized
}

/// Whether a relative path stays inside its base directory.
///
/// Rejects absolute paths and any path with a `..` component.
pub fn is_contained(relative: impl AsRef<Path>) -> bool {
    let relative = relative.as_ref();
    !relative.has_root()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
