//! Persistent, thread-safe lock store

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ccmd_fs::{FileSystem, codec, io};
use chrono::Utc;
use serde_yaml::Value;

use super::{FORMAT_VERSION, LockEntry, LockFile, SUPPORTED_MAJOR};
use crate::{Error, Result};

const STORE: &str = "Lock store";

/// Owns one lock file and the in-memory state loaded from it.
///
/// Every operation holds the store's `RwLock` for its whole duration, so
/// concurrent callers in one process never observe a half-applied mutation
/// and two saves never race on the temporary file. Reads return owned
/// copies.
///
/// Mutations only change memory; call [`LockStore::save`] to persist them.
#[derive(Debug)]
pub struct LockStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    state: RwLock<Option<LockFile>>,
}

impl LockStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            state: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.read_state().is_some()
    }

    /// Load the lock file, replacing any in-memory state.
    ///
    /// A missing (or blank) file yields an empty store at the current format
    /// version.
    ///
    /// # Errors
    ///
    /// [`Error::LockCorrupt`] when the file cannot be parsed or holds invalid
    /// entries, [`Error::UnsupportedLockVersion`] for another major format.
    /// A corrupt file is never replaced by an empty store.
    pub fn load(&self) -> Result<()> {
        let mut state = self.write_state();
        let file = match io::read_text(self.fs.as_ref(), &self.path) {
            Ok(text) => self.parse(&text)?,
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %self.path.display(), "No lock file, starting empty");
                LockFile::new()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            path = %self.path.display(),
            commands = file.commands.len(),
            "Loaded lock file"
        );
        *state = Some(file);
        Ok(())
    }

    /// Persist the in-memory state.
    ///
    /// The current on-disk file is first copied to `<file>.bak` (best
    /// effort). The new content is written to a temporary sibling and renamed
    /// over the lock file, so a failed save leaves the old file intact.
    pub fn save(&self) -> Result<()> {
        let state = self.write_state();
        let file = state.as_ref().ok_or(Error::NotLoaded { store: STORE })?;
        let text = codec::encode(&self.path, file)?;

        match io::backup_file(self.fs.as_ref(), &self.path) {
            Ok(Some(backup)) => {
                tracing::debug!(backup = %backup.display(), "Backed up lock file");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to back up lock file");
            }
        }

        io::write_atomic(self.fs.as_ref(), &self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "Saved lock file");
        Ok(())
    }

    /// Insert `entry`, replacing any entry with the same name.
    ///
    /// Both timestamps are set to now.
    pub fn add_command(&self, mut entry: LockEntry) -> Result<()> {
        let now = Utc::now();
        entry.installed_at = now;
        entry.updated_at = now;
        entry.check().map_err(Error::invalid_input)?;

        let mut state = self.write_state();
        let file = state.as_mut().ok_or(Error::NotLoaded { store: STORE })?;
        let name = entry.name.clone();
        if file.commands.insert(name.clone(), entry).is_some() {
            tracing::debug!(%name, "Replaced existing lock entry");
        }
        Ok(())
    }

    /// Replace the stored entry `name` with `entry`.
    ///
    /// The stored `installed_at` is kept and `updated_at` refreshed.
    pub fn replace_command(&self, name: &str, entry: LockEntry) -> Result<()> {
        let mut state = self.write_state();
        let file = state.as_mut().ok_or(Error::NotLoaded { store: STORE })?;
        let current = file
            .commands
            .get_mut(name)
            .ok_or_else(|| Error::command_not_found(name))?;
        commit_replacement(current, entry)
    }

    /// Copy the entry `name`, apply `mutator` to the copy and replace the
    /// stored entry with it, all under one write lock.
    pub fn update_command<F>(&self, name: &str, mutator: F) -> Result<()>
    where
        F: FnOnce(&mut LockEntry),
    {
        let mut state = self.write_state();
        let file = state.as_mut().ok_or(Error::NotLoaded { store: STORE })?;
        let current = file
            .commands
            .get_mut(name)
            .ok_or_else(|| Error::command_not_found(name))?;
        let mut copy = current.clone();
        mutator(&mut copy);
        commit_replacement(current, copy)
    }

    /// Remove and return the entry `name`.
    pub fn remove_command(&self, name: &str) -> Result<LockEntry> {
        let mut state = self.write_state();
        let file = state.as_mut().ok_or(Error::NotLoaded { store: STORE })?;
        file.commands
            .remove(name)
            .ok_or_else(|| Error::command_not_found(name))
    }

    pub fn get_command(&self, name: &str) -> Result<Option<LockEntry>> {
        self.with_file(|file| file.commands.get(name).cloned())
    }

    /// All entries, ordered by name.
    pub fn list_commands(&self) -> Result<Vec<LockEntry>> {
        self.with_file(|file| file.commands.values().cloned().collect())
    }

    pub fn has_command(&self, name: &str) -> Result<bool> {
        self.with_file(|file| file.commands.contains_key(name))
    }

    pub fn names(&self) -> Result<Vec<String>> {
        self.with_file(|file| file.commands.keys().cloned().collect())
    }

    /// A copy of the whole lock file.
    pub fn snapshot(&self) -> Result<LockFile> {
        self.with_file(LockFile::clone)
    }

    fn with_file<T>(&self, f: impl FnOnce(&LockFile) -> T) -> Result<T> {
        let state = self.read_state();
        let file = state.as_ref().ok_or(Error::NotLoaded { store: STORE })?;
        Ok(f(file))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Option<LockFile>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Option<LockFile>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn parse(&self, text: &str) -> Result<LockFile> {
        if text.trim().is_empty() {
            return Ok(LockFile::new());
        }

        let corrupt = |message: String| Error::LockCorrupt {
            path: self.path.clone(),
            message,
        };

        let mut value: Value = codec::decode(&self.path, text).map_err(|e| corrupt(e.to_string()))?;
        let Value::Mapping(map) = &mut value else {
            return Err(corrupt("expected a mapping at the top level".into()));
        };

        // Accept an unquoted `version: 1.0`, which YAML reads as a number.
        let version = match map.get("version") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(corrupt("'version' must be a string".into())),
            None => return Err(corrupt("missing 'version'".into())),
        };
        if version.split('.').next() != Some(SUPPORTED_MAJOR) {
            return Err(Error::UnsupportedLockVersion {
                path: self.path.clone(),
                version,
            });
        }
        map.insert(Value::from("version"), Value::String(version));

        let mut file: LockFile =
            serde_yaml::from_value(value).map_err(|e| corrupt(e.to_string()))?;

        for (key, entry) in &file.commands {
            if key != &entry.name {
                return Err(corrupt(format!(
                    "entry '{key}' is recorded under the name '{}'",
                    entry.name
                )));
            }
            entry
                .check()
                .map_err(|message| corrupt(format!("entry '{key}': {message}")))?;
        }

        if file.version != FORMAT_VERSION {
            tracing::debug!(from = %file.version, to = FORMAT_VERSION, "Upgrading lock format version");
            file.version = FORMAT_VERSION.to_string();
        }
        Ok(file)
    }
}

fn commit_replacement(current: &mut LockEntry, mut entry: LockEntry) -> Result<()> {
    if entry.name != current.name {
        return Err(Error::invalid_input(format!(
            "cannot rename lock entry '{}' to '{}'",
            current.name, entry.name
        )));
    }
    entry.installed_at = current.installed_at;
    entry.updated_at = Utc::now().max(current.installed_at);
    entry.check().map_err(Error::invalid_input)?;
    *current = entry;
    Ok(())
}
