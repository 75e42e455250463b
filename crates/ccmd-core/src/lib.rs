//! Core engine for ccmd
//!
//! This crate turns repository specifications into installed command
//! packages and keeps three pieces of project state consistent:
//!
//! - the declared dependency list in the project manifest ([`ConfigStore`]),
//! - the installed facts in the lock file ([`LockStore`]),
//! - the package trees under the install root ([`ProjectLayout`]).
//!
//! [`Installer`] drives single installs and removals; [`Reconciler`] diffs
//! declared against installed state and converges them.

pub mod batch;
pub mod config;
pub mod error;
pub mod installer;
pub mod layout;
pub mod lock;
pub mod manifest;
mod serde_helpers;
pub mod spec;
pub mod structure;
pub mod sync;
pub mod validation;

pub use batch::{BatchFailure, BatchReport, ItemFailure};
pub use config::{CommandSpec, ConfigStore, ProjectConfig};
pub use error::{Error, Result};
pub use installer::{InstallOutcome, InstallRequest, Installer, RemoveOutcome};
pub use layout::ProjectLayout;
pub use lock::{LockEntry, LockFile, LockStore};
pub use manifest::PackageManifest;
pub use spec::{RepositorySpec, SpecResolver};
pub use structure::{StructureIssue, StructureReport, check_structure};
pub use sync::{
    AssumeNo, AssumeYes, CheckReport, CheckStatus, DriftItem, Reconciler, RemovalPrompt,
    SyncOptions, SyncPlan, SyncReport,
};
pub use validation::{StructureValidator, ValidationError, ValidationKind};
