//! The filesystem capability used by every ccmd store and the installer.
//!
//! Everything that reads or writes project state goes through [`FileSystem`]
//! so the same code runs against the real disk ([`crate::OsFs`]) and against
//! the in-memory double ([`crate::MemoryFs`]) in tests.

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
}

/// Minimal metadata about a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    /// Length in bytes (zero for directories).
    pub len: u64,
}

impl FileStat {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }
}

/// Narrow filesystem capability.
///
/// Implementations must be safe to share between threads. Errors are plain
/// [`io::Error`]s so callers can inspect [`io::ErrorKind`]; wrapping with a
/// path happens at the call site via [`crate::Error::io`].
pub trait FileSystem: Debug + Send + Sync {
    /// Read the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate a file and write `contents` to it.
    ///
    /// The parent directory must already exist.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Stat a path without following it further than the OS does.
    fn metadata(&self, path: &Path) -> io::Result<FileStat>;

    /// Create a directory and all of its missing ancestors.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename a file or directory, replacing a file at `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// List the immediate children of a directory, sorted by path.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
