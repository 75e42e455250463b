//! In-memory [`FileSystem`] with fault injection.
//!
//! Used by tests to exercise atomic-write and backup behavior without
//! touching disk, and to make individual operations fail on demand.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::filesystem::{FileKind, FileStat, FileSystem};
use crate::path::lexical_normalize;

/// Operations that can be made to fail with [`MemoryFs::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    Read,
    Write,
    Rename,
    RemoveFile,
    RemoveDir,
    CreateDir,
}

#[derive(Debug, Clone)]
struct Fault {
    op: FaultOp,
    path: PathBuf,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    faults: Vec<Fault>,
}

impl State {
    fn is_dir(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || path.parent().is_none() || self.dirs.contains(path)
    }

    fn parent_exists(&self, path: &Path) -> bool {
        path.parent().is_none_or(|parent| self.is_dir(parent))
    }

    fn check_fault(&self, op: FaultOp, paths: &[&Path]) -> io::Result<()> {
        let hit = self
            .faults
            .iter()
            .any(|f| f.op == op && paths.iter().any(|p| *p == f.path));
        if hit {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected {op:?} failure"),
            ))
        } else {
            Ok(())
        }
    }

    fn has_children(&self, dir: &Path) -> bool {
        self.files.keys().any(|p| p.parent() == Some(dir))
            || self.dirs.iter().any(|p| p.parent() == Some(dir))
    }
}

/// A thread-safe in-memory filesystem.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every future `op` touching `path` fail with `PermissionDenied`.
    ///
    /// For renames the fault matches either the source or the destination.
    pub fn fail(&self, op: FaultOp, path: impl AsRef<Path>) {
        let path = lexical_normalize(path);
        self.lock().faults.push(Fault { op, path });
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock().files.keys().cloned().collect()
    }
}

impl FileSystem for MemoryFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = lexical_normalize(path);
        let state = self.lock();
        state.check_fault(FaultOp::Read, &[&path])?;
        match state.files.get(&path) {
            Some(bytes) => Ok(bytes.clone()),
            None if state.dirs.contains(&path) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(&path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut state = self.lock();
        state.check_fault(FaultOp::Write, &[&path])?;
        if state.is_dir(&path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        if !state.parent_exists(&path) {
            return Err(not_found(path.parent().unwrap_or(&path)));
        }
        state.files.insert(path, contents.to_vec());
        Ok(())
    }

    fn metadata(&self, path: &Path) -> io::Result<FileStat> {
        let path = lexical_normalize(path);
        let state = self.lock();
        if let Some(bytes) = state.files.get(&path) {
            return Ok(FileStat {
                kind: FileKind::File,
                len: bytes.len() as u64,
            });
        }
        if state.is_dir(&path) {
            return Ok(FileStat {
                kind: FileKind::Dir,
                len: 0,
            });
        }
        Err(not_found(&path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut state = self.lock();
        state.check_fault(FaultOp::CreateDir, &[&path])?;
        let ancestors: Vec<PathBuf> = path
            .ancestors()
            .filter(|a| !a.as_os_str().is_empty() && a.parent().is_some())
            .map(Path::to_path_buf)
            .collect();
        for ancestor in ancestors.into_iter().rev() {
            if state.files.contains_key(&ancestor) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is a file", ancestor.display()),
                ));
            }
            state.dirs.insert(ancestor);
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from = lexical_normalize(from);
        let to = lexical_normalize(to);
        let mut state = self.lock();
        state.check_fault(FaultOp::Rename, &[&from, &to])?;
        if from == to {
            return Ok(());
        }
        if !state.parent_exists(&to) {
            return Err(not_found(to.parent().unwrap_or(&to)));
        }

        if let Some(bytes) = state.files.get(&from).cloned() {
            if state.dirs.contains(&to) {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("{} is a directory", to.display()),
                ));
            }
            state.files.remove(&from);
            state.files.insert(to, bytes);
            return Ok(());
        }

        if !state.dirs.contains(&from) {
            return Err(not_found(&from));
        }
        if state.files.contains_key(&to) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is a file", to.display()),
            ));
        }
        if state.dirs.contains(&to) && state.has_children(&to) {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("{} is not empty", to.display()),
            ));
        }
        if to.starts_with(&from) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot move a directory into itself",
            ));
        }

        let moved_files: Vec<PathBuf> = state
            .files
            .keys()
            .filter(|p| p.starts_with(&from))
            .cloned()
            .collect();
        for old in moved_files {
            if let Some(bytes) = state.files.remove(&old) {
                let relative = old.strip_prefix(&from).unwrap_or(&old).to_path_buf();
                state.files.insert(to.join(relative), bytes);
            }
        }
        let moved_dirs: Vec<PathBuf> = state
            .dirs
            .iter()
            .filter(|p| p.starts_with(&from))
            .cloned()
            .collect();
        for old in moved_dirs {
            state.dirs.remove(&old);
            let relative = old.strip_prefix(&from).unwrap_or(&old).to_path_buf();
            if relative.as_os_str().is_empty() {
                state.dirs.insert(to.clone());
            } else {
                state.dirs.insert(to.join(relative));
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut state = self.lock();
        state.check_fault(FaultOp::RemoveFile, &[&path])?;
        state
            .files
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| not_found(&path))
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = lexical_normalize(path);
        let mut state = self.lock();
        state.check_fault(FaultOp::RemoveDir, &[&path])?;
        if !state.dirs.contains(&path) {
            if state.files.contains_key(&path) {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is a file", path.display()),
                ));
            }
            return Err(not_found(&path));
        }
        state.files.retain(|p, _| !p.starts_with(&path));
        state.dirs.retain(|p| !p.starts_with(&path));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let path = lexical_normalize(path);
        let state = self.lock();
        if !state.is_dir(&path) {
            return Err(not_found(&path));
        }
        let children: BTreeSet<PathBuf> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(path.as_path()))
            .cloned()
            .collect();
        Ok(children.into_iter().collect())
    }
}
