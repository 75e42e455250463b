//! Error types for ccmd-core

use std::path::PathBuf;

use crate::batch::BatchFailure;
use crate::validation::ValidationError;

/// Result type for ccmd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ccmd-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed repository spec, empty name or bad override
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A command (or other named item) is absent where it is required
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    /// Install target already occupied and `force` not set
    #[error("Command '{name}' is already installed at {path} (use --force to reinstall)")]
    AlreadyExists { name: String, path: PathBuf },

    /// Package failed structural validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Lock file exists but cannot be trusted
    #[error("Lock file {path} is corrupt: {message}")]
    LockCorrupt { path: PathBuf, message: String },

    /// Lock file written by an incompatible format version
    #[error("Lock file {path} has unsupported format version {version}")]
    UnsupportedLockVersion { path: PathBuf, version: String },

    /// Store used before `load()`
    #[error("{store} has not been loaded")]
    NotLoaded { store: &'static str },

    /// Project manifest absent
    #[error("Project manifest not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Project manifest present but unusable
    #[error("Project manifest {path} is invalid: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Some items of a batch failed; the rest succeeded
    #[error("Partial failure: {0}")]
    PartialFailure(BatchFailure),

    /// Every attempted item of a batch failed
    #[error("Batch failed: {0}")]
    BatchFailed(BatchFailure),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from ccmd-fs
    #[error(transparent)]
    Fs(#[from] ccmd_fs::Error),

    /// Fetch error from ccmd-git
    #[error(transparent)]
    Git(#[from] ccmd_git::Error),
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn command_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            what: "Command",
            name: name.into(),
        }
    }

    /// Whether this is a batch that partly succeeded.
    ///
    /// Callers report these as warnings rather than failures.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialFailure(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
