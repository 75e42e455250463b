use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ccmd_fs::{FileSystem, codec, io};

use super::{CommandSpec, ProjectConfig};
use crate::spec::SpecResolver;
use crate::{Error, Result};

const STORE: &str = "Project manifest";

/// Reads and writes the project manifest's declared dependency list.
///
/// Declarations are keyed by the normalized repository key, so
/// `acme/tool`, `https://github.com/acme/tool.git` and
/// `github.com/acme/tool` all name the same entry.
#[derive(Debug)]
pub struct ConfigStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    resolver: SpecResolver,
    state: RwLock<Option<ProjectConfig>>,
}

impl ConfigStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, resolver: SpecResolver) -> Self {
        Self {
            fs,
            path: path.into(),
            resolver,
            state: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the manifest file exists on disk.
    pub fn exists(&self) -> bool {
        self.fs.is_file(&self.path)
    }

    pub fn is_loaded(&self) -> bool {
        self.read_state().is_some()
    }

    /// Load the manifest.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigNotFound`] when the file is absent,
    /// [`Error::ConfigInvalid`] when it cannot be parsed.
    pub fn load(&self) -> Result<()> {
        let mut state = self.write_state();
        let text = match io::read_text(self.fs.as_ref(), &self.path) {
            Ok(text) => text,
            Err(e) if e.is_not_found() => {
                return Err(Error::ConfigNotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        *state = Some(self.parse(&text)?);
        Ok(())
    }

    /// Load the manifest, or start from an empty one when it is absent.
    pub fn load_or_default(&self) -> Result<()> {
        match self.load() {
            Err(Error::ConfigNotFound { .. }) => {
                *self.write_state() = Some(ProjectConfig::default());
                Ok(())
            }
            other => other,
        }
    }

    /// Write the manifest atomically. No backup is kept.
    pub fn save(&self) -> Result<()> {
        let state = self.write_state();
        let config = state.as_ref().ok_or(Error::NotLoaded { store: STORE })?;
        let text = codec::encode(&self.path, config)?;
        io::write_atomic(self.fs.as_ref(), &self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "Saved project manifest");
        Ok(())
    }

    /// Declare `repo` at `version`, updating an existing declaration of the
    /// same repository in place.
    ///
    /// Returns whether the manifest changed.
    pub fn add_command(&self, repo: &str, version: Option<&str>) -> Result<bool> {
        let key = self.resolver.config_key(repo)?;
        let wanted = CommandSpec::new(key.clone(), version);

        let mut state = self.write_state();
        let config = state.as_mut().ok_or(Error::NotLoaded { store: STORE })?;
        match config
            .commands
            .iter_mut()
            .find(|c| self.key_of(&c.repo) == key)
        {
            Some(existing) if *existing == wanted => Ok(false),
            Some(existing) => {
                *existing = wanted;
                Ok(true)
            }
            None => {
                config.commands.push(wanted);
                Ok(true)
            }
        }
    }

    /// Drop every declaration of `repo`. Absence is not an error.
    pub fn remove_command(&self, repo: &str) -> Result<bool> {
        let key = self.resolver.config_key(repo)?;
        self.retain(|store, c| store.key_of(&c.repo) != key)
    }

    /// Drop every declaration whose derived command name is `name`.
    pub fn remove_by_name(&self, name: &str) -> Result<bool> {
        self.retain(|store, c| store.name_of(c).as_deref() != Some(name))
    }

    pub fn commands(&self) -> Result<Vec<CommandSpec>> {
        Ok(self.project()?.commands)
    }

    pub fn project(&self) -> Result<ProjectConfig> {
        let state = self.read_state();
        state.clone().ok_or(Error::NotLoaded { store: STORE })
    }

    /// Replace the in-memory manifest (marks the store loaded).
    pub fn set_project(&self, config: ProjectConfig) {
        *self.write_state() = Some(config);
    }

    /// Derived command name of a declaration, if its repository parses.
    pub fn name_of(&self, command: &CommandSpec) -> Option<String> {
        self.resolver
            .parse(&command.repo)
            .ok()
            .map(|spec| spec.command_name())
    }

    fn key_of(&self, repo: &str) -> String {
        self.resolver
            .config_key(repo)
            .unwrap_or_else(|_| repo.to_string())
    }

    fn retain(&self, keep: impl Fn(&Self, &CommandSpec) -> bool) -> Result<bool> {
        let mut state = self.write_state();
        let config = state.as_mut().ok_or(Error::NotLoaded { store: STORE })?;
        let before = config.commands.len();
        config.commands.retain(|c| keep(self, c));
        Ok(config.commands.len() != before)
    }

    fn parse(&self, text: &str) -> Result<ProjectConfig> {
        if text.trim().is_empty() {
            return Ok(ProjectConfig::default());
        }
        codec::decode(&self.path, text).map_err(|e| Error::ConfigInvalid {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Option<ProjectConfig>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Option<ProjectConfig>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
