//! Package installation and removal.
//!
//! A single install runs strictly in order:
//!
//! 1. **Resolve** the spec into a URL, ref and command name.
//! 2. **Fetch** into a fresh staging directory under the install root.
//! 3. **Validate** the staged tree with [`StructureValidator`].
//! 4. **Place** the tree at `<install-dir>/<name>/` and write the companion
//!    document `<install-dir>/<name>.md`.
//! 5. **Commit** the lock entry, then declare the repository in the project
//!    manifest (best effort).
//!
//! A failure in steps 1-4 leaves the install path and the lock store as they
//! were: a replaced installation is moved aside into the staging directory
//! and moved back on failure. A failure in step 5 is reported, but the placed
//! package stays.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ccmd_fs::checksum::compute_checksum;
use ccmd_fs::{FileSystem, io};
use ccmd_git::{FetchRequest, Fetcher};

use crate::batch::{BatchReport, ItemFailure, best_effort};
use crate::config::ConfigStore;
use crate::layout::ProjectLayout;
use crate::lock::{LockEntry, LockStore, resolved_location};
use crate::spec::{RepositorySpec, SpecResolver};
use crate::validation::{StructureValidator, validate_command_name};
use crate::{Error, Result};

/// What to install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    /// Repository spec, optionally with an `@ref` suffix
    pub spec: String,
    /// Ref override; wins over the spec's suffix
    pub version: Option<String>,
    /// Command name override
    pub name: Option<String>,
    /// Replace an existing installation
    pub force: bool,
}

impl InstallRequest {
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// A completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub name: String,
    /// Version recorded in the lock entry
    pub version: String,
    pub source: String,
    pub commit: Option<String>,
    /// Installed package directory
    pub path: PathBuf,
    /// Best-effort steps that failed
    pub warnings: Vec<String>,
}

/// A completed removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub name: String,
    pub warnings: Vec<String>,
}

/// Installs and removes command packages under a [`ProjectLayout`].
///
/// Clones share one placement lock, so concurrent installs and removals
/// through the same installer run one at a time.
#[derive(Debug, Clone)]
pub struct Installer {
    fs: Arc<dyn FileSystem>,
    fetcher: Arc<dyn Fetcher>,
    layout: ProjectLayout,
    resolver: SpecResolver,
    placement: Arc<Mutex<()>>,
}

impl Installer {
    pub fn new(fs: Arc<dyn FileSystem>, fetcher: Arc<dyn Fetcher>, layout: ProjectLayout) -> Self {
        Self {
            fs,
            fetcher,
            layout,
            resolver: SpecResolver::new(),
            placement: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_resolver(mut self, resolver: SpecResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn resolver(&self) -> &SpecResolver {
        &self.resolver
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Install one package and save the lock store.
    ///
    /// When the project manifest exists the repository is declared there
    /// too; a failure to do so is returned in [`InstallOutcome::warnings`].
    pub fn install(
        &self,
        lock: &LockStore,
        config: &ConfigStore,
        request: &InstallRequest,
    ) -> Result<InstallOutcome> {
        let spec = self.resolver.resolve(
            &request.spec,
            request.version.as_deref(),
            request.name.as_deref(),
        )?;
        let mut outcome = self.install_spec(lock, &spec, request.force)?;
        lock.save()?;

        if config.exists() {
            best_effort(
                "update project manifest",
                declare(config, &spec),
                &mut outcome.warnings,
            );
        }

        tracing::info!(
            name = %outcome.name,
            version = %outcome.version,
            source = %outcome.source,
            "Installed command"
        );
        Ok(outcome)
    }

    /// Install every declared command that the lock store does not already
    /// satisfy, then save the lock store once.
    ///
    /// An entry is satisfied when a lock entry with its derived name exists
    /// and, if the declaration pins a version, records that version. With
    /// `force` every declared entry is reinstalled.
    ///
    /// # Errors
    ///
    /// [`Error::PartialFailure`] when some entries failed and some were
    /// installed, [`Error::BatchFailed`] when every attempted entry failed.
    /// Satisfied entries are not attempted and never count as successes:
    /// two satisfied entries plus one failure is still `BatchFailed`.
    pub fn install_from_config(
        &self,
        lock: &LockStore,
        config: &ConfigStore,
        force: bool,
    ) -> Result<BatchReport> {
        let declared = config.commands()?;
        let mut report = BatchReport::new();
        let mut seen = BTreeSet::new();

        for command in &declared {
            let spec = match self
                .resolver
                .resolve(&command.repo, command.version.as_deref(), None)
            {
                Ok(spec) => spec,
                Err(e) => {
                    tracing::warn!(repo = %command.repo, error = %e, "Skipping unparseable declaration");
                    report.failed.push(ItemFailure::new(&command.repo, e));
                    continue;
                }
            };

            let name = spec.command_name();
            if !seen.insert(name.clone()) {
                let err = Error::invalid_input(format!("command '{name}' is declared more than once"));
                report.failed.push(ItemFailure::new(name, err));
                continue;
            }

            let installed = lock.get_command(&name)?;
            let satisfied = installed.as_ref().is_some_and(|entry| {
                command
                    .version
                    .as_ref()
                    .is_none_or(|version| *version == entry.version)
            });
            if satisfied && !force {
                tracing::debug!(%name, "Already installed");
                report.skipped.push(name);
                continue;
            }

            // An outdated lock entry is replaced without requiring force.
            let overwrite = force || installed.is_some();
            match self.install_spec(lock, &spec, overwrite) {
                Ok(outcome) => {
                    tracing::info!(name = %outcome.name, version = %outcome.version, "Installed command");
                    report.succeeded.push(outcome.name);
                }
                Err(e) => {
                    tracing::warn!(%name, error = %e, "Install failed");
                    report.failed.push(ItemFailure::new(name, e));
                }
            }
        }

        if !report.succeeded.is_empty() {
            lock.save()?;
        }
        report.into_result()
    }

    /// Remove an installed command and save the lock store.
    ///
    /// With `save`, the declaration is also dropped from the project
    /// manifest (best effort).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when `name` is not in the lock store; nothing is
    /// written in that case.
    pub fn remove(
        &self,
        lock: &LockStore,
        config: &ConfigStore,
        name: &str,
        save: bool,
    ) -> Result<RemoveOutcome> {
        self.remove_installed(lock, name)?;
        lock.save()?;

        let mut warnings = Vec::new();
        if save && config.exists() {
            best_effort(
                "update project manifest",
                undeclare(config, name),
                &mut warnings,
            );
        }

        tracing::info!(%name, "Removed command");
        Ok(RemoveOutcome {
            name: name.to_string(),
            warnings,
        })
    }

    /// Steps 1-4 plus the lock entry, without saving.
    pub(crate) fn install_spec(
        &self,
        lock: &LockStore,
        spec: &RepositorySpec,
        force: bool,
    ) -> Result<InstallOutcome> {
        let fs = self.fs.as_ref();
        let name = spec.command_name();
        validate_command_name(&name)?;

        // Held from the occupancy check until the lock entry is recorded.
        let _placement = self.placement();
        let target = self.layout.package_dir(&name);
        let occupied = lock.has_command(&name)?
            || fs.exists(&target)
            || fs.exists(&self.layout.companion_path(&name));
        if occupied && !force {
            return Err(Error::AlreadyExists { name, path: target });
        }

        let staging = self.layout.new_staging_area();
        fs.create_dir_all(&staging)
            .map_err(|e| ccmd_fs::Error::io(&staging, e))?;

        let result = self.stage_and_place(lock, spec, &name, &staging);

        if let Err(e) = io::remove_if_exists(fs, &staging) {
            tracing::warn!(path = %staging.display(), error = %e, "Failed to clean up staging directory");
        }
        result
    }

    fn stage_and_place(
        &self,
        lock: &LockStore,
        spec: &RepositorySpec,
        name: &str,
        staging: &Path,
    ) -> Result<InstallOutcome> {
        let fs = self.fs.as_ref();
        let staged = staging.join(name);
        let reference = spec.version.as_deref();

        tracing::debug!(url = %spec.url, ?reference, staged = %staged.display(), "Fetching package");
        let fetched = self
            .fetcher
            .fetch(&FetchRequest::new(&spec.url, reference), &staged)?;
        io::remove_if_exists(fs, &staged.join(".git"))?;

        let manifest = StructureValidator::new(fs).validate(&staged)?;
        let entry_doc = staged.join(manifest.entry_path());
        let entry_bytes = fs
            .read(&entry_doc)
            .map_err(|e| ccmd_fs::Error::io(&entry_doc, e))?;

        self.place(name, &staged, staging, &entry_bytes)?;

        let version = reference.map_or_else(|| manifest.version.clone(), str::to_string);
        let mut entry = LockEntry::new(name, version.clone(), spec.url.clone());
        entry.resolved = resolved_location(&spec.url, reference, fetched.commit.as_deref());
        entry.commit = fetched.commit.clone();
        entry.dependencies = manifest.dependencies.clone();
        entry.metadata = BTreeMap::from([
            ("description".to_string(), manifest.description.clone()),
            ("author".to_string(), manifest.author.clone()),
            ("entry".to_string(), manifest.entry_path().to_string()),
            ("checksum".to_string(), compute_checksum(&entry_bytes)),
        ]);
        // A reinstall keeps the original install time.
        if lock.has_command(name)? {
            lock.replace_command(name, entry)?;
        } else {
            lock.add_command(entry)?;
        }

        Ok(InstallOutcome {
            name: name.to_string(),
            version,
            source: spec.url.clone(),
            commit: fetched.commit,
            path: self.layout.package_dir(name),
            warnings: Vec::new(),
        })
    }

    /// Move the staged tree into place and write the companion document.
    ///
    /// Any existing installation is moved into `staging` first and restored
    /// if placement fails.
    fn place(&self, name: &str, staged: &Path, staging: &Path, entry: &[u8]) -> Result<()> {
        let fs = self.fs.as_ref();
        let target = self.layout.package_dir(name);
        let companion = self.layout.companion_path(name);
        let previous_dir = staging.join(".previous");
        let previous_companion = staging.join(".previous.md");

        let moved_dir = move_aside(fs, &target, &previous_dir)?;
        let moved_companion = match move_aside(fs, &companion, &previous_companion) {
            Ok(moved) => moved,
            Err(e) => {
                if moved_dir {
                    restore(fs, &previous_dir, &target);
                }
                return Err(e);
            }
        };

        let placed = fs
            .rename(staged, &target)
            .map_err(|e| Error::from(ccmd_fs::Error::io(&target, e)))
            .and_then(|()| io::write_atomic(fs, &companion, entry).map_err(Error::from));

        if let Err(e) = placed {
            tracing::warn!(%name, error = %e, "Placement failed, rolling back");
            discard(fs, &target);
            discard(fs, &companion);
            if moved_dir {
                restore(fs, &previous_dir, &target);
            }
            if moved_companion {
                restore(fs, &previous_companion, &companion);
            }
            return Err(e);
        }
        Ok(())
    }

    fn placement(&self) -> MutexGuard<'_, ()> {
        self.placement.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delete both halves of `name` and its lock entry, without saving.
    pub(crate) fn remove_installed(&self, lock: &LockStore, name: &str) -> Result<()> {
        let _placement = self.placement();
        if !lock.has_command(name)? {
            return Err(Error::command_not_found(name));
        }
        validate_command_name(name)?;

        let fs = self.fs.as_ref();
        for path in [
            self.layout.package_dir(name),
            self.layout.companion_path(name),
        ] {
            if !io::remove_if_exists(fs, &path)? {
                tracing::debug!(path = %path.display(), "Already absent");
            }
        }
        lock.remove_command(name)?;
        Ok(())
    }
}

fn declare(config: &ConfigStore, spec: &RepositorySpec) -> Result<()> {
    if !config.is_loaded() {
        config.load()?;
    }
    if config.add_command(&spec.url, spec.version.as_deref())? {
        config.save()?;
    }
    Ok(())
}

fn undeclare(config: &ConfigStore, name: &str) -> Result<()> {
    if !config.is_loaded() {
        config.load()?;
    }
    if config.remove_by_name(name)? {
        config.save()?;
    }
    Ok(())
}

fn move_aside(fs: &dyn FileSystem, from: &Path, to: &Path) -> Result<bool> {
    if !fs.exists(from) {
        return Ok(false);
    }
    fs.rename(from, to)
        .map_err(|e| ccmd_fs::Error::io(from, e))?;
    Ok(true)
}

fn restore(fs: &dyn FileSystem, from: &Path, to: &Path) {
    if let Err(e) = fs.rename(from, to) {
        tracing::error!(
            from = %from.display(),
            to = %to.display(),
            error = %e,
            "Failed to restore previous installation"
        );
    }
}

fn discard(fs: &dyn FileSystem, path: &Path) {
    if let Err(e) = io::remove_if_exists(fs, path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output");
    }
}
