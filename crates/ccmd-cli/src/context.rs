//! Project context
//!
//! Builds the filesystem, stores and installer for one invocation. Nothing
//! here is global: every command receives the context it runs against.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ccmd_core::{ConfigStore, Installer, LockStore, ProjectLayout, SpecResolver};
use ccmd_fs::{FileSystem, OsFs};
use ccmd_git::{Fetcher, GitFetcher};

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};

/// Everything a command needs to act on one project.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub installer: Installer,
    pub lock: LockStore,
    pub config: ConfigStore,
}

impl ProjectContext {
    /// Open the project selected by `args`, loading the lock file and, when
    /// present, the project manifest.
    pub fn open(args: &ProjectArgs) -> Result<Self> {
        let root = resolve_root(args.project.as_deref())?;
        let fs: Arc<dyn FileSystem> = Arc::new(OsFs::new());
        let fetcher: Arc<dyn Fetcher> = Arc::new(GitFetcher::new());
        Self::with_parts(root, args, fs, fetcher)
    }

    fn with_parts(
        root: PathBuf,
        args: &ProjectArgs,
        fs: Arc<dyn FileSystem>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let mut layout = ProjectLayout::new(root);
        if let Some(dir) = &args.install_dir {
            layout = layout.with_install_dir(dir);
        }
        let resolver = match &args.default_host {
            Some(host) => SpecResolver::with_default_host(host.as_str()),
            None => SpecResolver::new(),
        };
        tracing::debug!(
            root = %layout.root().display(),
            install_dir = %layout.install_dir().display(),
            "Opening project"
        );

        let lock = LockStore::new(fs.clone(), layout.lock_path());
        lock.load()?;

        let config = ConfigStore::new(fs.clone(), layout.manifest_path(), resolver.clone());
        if config.exists() {
            config.load()?;
        }

        let installer = Installer::new(fs, fetcher, layout.clone()).with_resolver(resolver);

        Ok(Self {
            layout,
            installer,
            lock,
            config,
        })
    }

    /// Fail unless the project manifest was found.
    pub fn require_manifest(&self) -> Result<()> {
        if self.config.is_loaded() {
            Ok(())
        } else {
            Err(CliError::user(format!(
                "No ccmd.yaml found in {}",
                self.layout.root().display()
            )))
        }
    }
}

fn resolve_root(project: Option<&Path>) -> Result<PathBuf> {
    let root = match project {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(CliError::user(format!(
            "Project directory does not exist: {}",
            root.display()
        )));
    }
    Ok(dunce::canonicalize(&root)?)
}
