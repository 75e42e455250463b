//! Atomic I/O operations built on the [`FileSystem`] capability

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Error, FileSystem, Result};

/// Path of the temporary sibling used by [`write_atomic`].
pub fn temp_path(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

/// Path of the `.bak` sibling used by [`backup_file`].
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename so readers only ever see the old or the new
/// content. If the rename fails the temporary file is removed and the target
/// is left untouched.
pub fn write_atomic(fs: &dyn FileSystem, path: &Path, content: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs.create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives in the same directory so the rename stays on one filesystem
    let temp = temp_path(path);

    if let Err(e) = fs.write(&temp, content) {
        let _ = fs.remove_file(&temp);
        return Err(Error::io(&temp, e));
    }

    if let Err(e) = fs.rename(&temp, path) {
        if let Err(cleanup) = fs.remove_file(&temp) {
            tracing::warn!(
                path = %temp.display(),
                error = %cleanup,
                "Failed to clean up temporary file after rename failure"
            );
        }
        return Err(Error::io(path, e));
    }

    Ok(())
}

/// Copy the current contents of `path` to its `.bak` sibling.
///
/// Returns `Ok(None)` when there is nothing to back up.
pub fn backup_file(fs: &dyn FileSystem, path: &Path) -> Result<Option<PathBuf>> {
    let bytes = match fs.read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };
    let backup = backup_path(path);
    fs.write(&backup, &bytes).map_err(|e| Error::io(&backup, e))?;
    Ok(Some(backup))
}

/// Read text content from a file.
pub fn read_text(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    fs.read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Remove a file or directory tree, treating a missing path as success.
///
/// Returns whether anything was removed.
pub fn remove_if_exists(fs: &dyn FileSystem, path: &Path) -> Result<bool> {
    let stat = match fs.metadata(path) {
        Ok(stat) => stat,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(path, e)),
    };
    let result = if stat.is_dir() {
        fs.remove_dir_all(path)
    } else {
        fs.remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}
